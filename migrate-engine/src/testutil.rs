//! An in-memory [`Client`] double for the export/import pipeline tests.
//! Not built outside `#[cfg(test)]`.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use migrate_client::{Client, ClientResult, CollectionId, CollectionItem, CollectionNode, Credentials, ItemsQuery, Session};
use serde_json::Value;

#[derive(Default)]
pub struct FakeClient {
    pub collections_tree: Vec<CollectionNode>,
    pub items: BTreeMap<String, Vec<CollectionItem>>,
    pub cards: BTreeMap<i64, Value>,
    pub dashboards: BTreeMap<i64, Value>,
    pub databases: Value,
    pub database_metadata: BTreeMap<i64, Value>,
    pub created_cards: Mutex<Vec<Value>>,
    pub updated_cards: Mutex<Vec<(i64, Value)>>,
    pub created_dashboards: Mutex<Vec<Value>>,
    pub created_collections: Mutex<Vec<Value>>,
    pub next_created_id: Mutex<i64>,
    pub put_permissions_graph_calls: Mutex<Vec<Value>>,
    pub put_collection_permissions_graph_calls: Mutex<Vec<Value>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            next_created_id: Mutex::new(1000),
            ..Default::default()
        }
    }

    fn items_key(collection_id: CollectionId) -> String {
        collection_id.to_string()
    }
}

#[async_trait]
impl Client for FakeClient {
    async fn establish_session(&self, _credentials: Credentials) -> ClientResult<Session> {
        Ok(Session::from_token("X-Metabase-Session", "fake-token"))
    }

    async fn get_collections_tree(&self, _archived: bool) -> ClientResult<Vec<CollectionNode>> {
        Ok(self.collections_tree.clone())
    }

    async fn get_collection_items(&self, collection_id: CollectionId, _query: &ItemsQuery) -> ClientResult<Vec<CollectionItem>> {
        Ok(self.items.get(&Self::items_key(collection_id)).cloned().unwrap_or_default())
    }

    async fn get_card(&self, id: i64) -> ClientResult<Value> {
        Ok(self.cards.get(&id).cloned().unwrap_or(Value::Null))
    }

    async fn get_dashboard(&self, id: i64) -> ClientResult<Value> {
        Ok(self.dashboards.get(&id).cloned().unwrap_or(Value::Null))
    }

    async fn get_databases(&self) -> ClientResult<Value> {
        Ok(self.databases.clone())
    }

    async fn get_database_metadata(&self, id: i64) -> ClientResult<Value> {
        Ok(self.database_metadata.get(&id).cloned().unwrap_or(Value::Null))
    }

    async fn create_card(&self, payload: &Value) -> ClientResult<i64> {
        let mut next = self.next_created_id.lock().unwrap();
        let id = *next;
        *next += 1;
        self.created_cards.lock().unwrap().push(payload.clone());
        Ok(id)
    }

    async fn update_card(&self, id: i64, payload: &Value) -> ClientResult<()> {
        self.updated_cards.lock().unwrap().push((id, payload.clone()));
        Ok(())
    }

    async fn create_dashboard(&self, payload: &Value) -> ClientResult<i64> {
        let mut next = self.next_created_id.lock().unwrap();
        let id = *next;
        *next += 1;
        self.created_dashboards.lock().unwrap().push(payload.clone());
        Ok(id)
    }

    async fn update_dashboard(&self, _id: i64, _payload: &Value) -> ClientResult<()> {
        Ok(())
    }

    async fn create_collection(&self, payload: &Value) -> ClientResult<i64> {
        let mut next = self.next_created_id.lock().unwrap();
        let id = *next;
        *next += 1;
        self.created_collections.lock().unwrap().push(payload.clone());
        Ok(id)
    }

    async fn update_collection(&self, _id: i64, _payload: &Value) -> ClientResult<()> {
        Ok(())
    }

    async fn get_permissions_graph(&self) -> ClientResult<Value> {
        Ok(Value::Null)
    }

    async fn put_permissions_graph(&self, graph: &Value) -> ClientResult<()> {
        self.put_permissions_graph_calls.lock().unwrap().push(graph.clone());
        Ok(())
    }

    async fn get_collection_permissions_graph(&self) -> ClientResult<Value> {
        Ok(Value::Null)
    }

    async fn put_collection_permissions_graph(&self, graph: &Value) -> ClientResult<()> {
        self.put_collection_permissions_graph_calls.lock().unwrap().push(graph.clone());
        Ok(())
    }
}
