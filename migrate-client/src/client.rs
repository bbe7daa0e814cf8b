//! The `Client` contract consumed by the export and import pipelines, and
//! a `reqwest`-backed implementation.
//!
//! The specification treats the HTTP client as a black box: session
//! management, retries, and pagination are its concern, not the core
//! engine's (spec §1, §5). `ReqwestClient` is expected to implement
//! idempotent retries with bounded backoff on transient failures; the
//! installer never retries above this layer.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::{Credentials, Session, SessionRequest, SessionResponse};
use crate::error::{ClientError, ClientResult};
use crate::models::{CollectionId, CollectionItem, CollectionNode, ItemsQuery};

/// Typed operations the migration engine needs from the analytics
/// platform's administration API.
#[async_trait]
pub trait Client: Send + Sync {
    async fn establish_session(&self, credentials: Credentials) -> ClientResult<Session>;

    async fn get_collections_tree(&self, archived: bool) -> ClientResult<Vec<CollectionNode>>;
    async fn get_collection_items(
        &self,
        collection_id: CollectionId,
        query: &ItemsQuery,
    ) -> ClientResult<Vec<CollectionItem>>;

    async fn get_card(&self, id: i64) -> ClientResult<Value>;
    async fn get_dashboard(&self, id: i64) -> ClientResult<Value>;

    async fn get_databases(&self) -> ClientResult<Value>;
    async fn get_database_metadata(&self, id: i64) -> ClientResult<Value>;

    async fn create_card(&self, payload: &Value) -> ClientResult<i64>;
    async fn update_card(&self, id: i64, payload: &Value) -> ClientResult<()>;

    async fn create_dashboard(&self, payload: &Value) -> ClientResult<i64>;
    async fn update_dashboard(&self, id: i64, payload: &Value) -> ClientResult<()>;

    async fn create_collection(&self, payload: &Value) -> ClientResult<i64>;
    async fn update_collection(&self, id: i64, payload: &Value) -> ClientResult<()>;

    async fn get_permissions_graph(&self) -> ClientResult<Value>;
    async fn put_permissions_graph(&self, graph: &Value) -> ClientResult<()>;

    async fn get_collection_permissions_graph(&self) -> ClientResult<Value>;
    async fn put_collection_permissions_graph(&self, graph: &Value) -> ClientResult<()>;
}

/// `reqwest`-backed implementation of [`Client`].
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http: reqwest::Client,
    base_url: Url,
    session: Option<Session>,
}

impl ReqwestClient {
    pub fn new(base_url: Url) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("metabase-migrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url,
            session: None,
        }
    }

    pub fn from_url(base_url: &str) -> ClientResult<Self> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    /// Attach a session obtained from an earlier `establish_session` call,
    /// returning a client that sends it on every subsequent request.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ClientResult<T> {
        let url = self.url(path)?;
        let mut request = self.http.request(method, url);
        if let Some(session) = &self.session {
            request = request.header(session.header_name, &session.header_value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn request_no_body<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> ClientResult<T> {
        self.request::<T>(method, path, None::<&()>).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            serde_json::from_str(&text).map_err(ClientError::from)
        } else {
            Err(ClientError::Server {
                status: status.as_u16(),
                body: text,
            })
        }
    }

    async fn created_id(&self, method: Method, path: &str, payload: &Value) -> ClientResult<i64> {
        #[derive(serde::Deserialize)]
        struct Created {
            id: i64,
        }
        let created: Created = self.request(method, path, Some(payload)).await?;
        Ok(created.id)
    }
}

#[async_trait]
impl Client for ReqwestClient {
    async fn establish_session(&self, credentials: Credentials) -> ClientResult<Session> {
        match credentials {
            Credentials::UserPassword { email, password } => {
                let body = SessionRequest {
                    username: &email,
                    password: &password,
                };
                let response: SessionResponse =
                    self.request(Method::POST, "/api/session", Some(&body)).await?;
                Ok(Session::from_token("X-Metabase-Session", response.id))
            }
            Credentials::SessionToken(token) => {
                Ok(Session::from_token("X-Metabase-Session", token))
            }
            Credentials::ApiKey(key) => Ok(Session::from_token("X-API-KEY", key)),
        }
    }

    async fn get_collections_tree(&self, archived: bool) -> ClientResult<Vec<CollectionNode>> {
        let path = format!("/api/collection/tree?archived={}", archived);
        self.request_no_body(Method::GET, &path).await
    }

    async fn get_collection_items(
        &self,
        collection_id: CollectionId,
        query: &ItemsQuery,
    ) -> ClientResult<Vec<CollectionItem>> {
        #[derive(serde::Deserialize)]
        struct Page {
            data: Vec<CollectionItem>,
        }
        let mut path = format!("/api/collection/{}/items?archived={}", collection_id, query.archived);
        for model in &query.models {
            path.push_str("&models=");
            path.push_str(model);
        }
        let page: Page = self.request_no_body(Method::GET, &path).await?;
        Ok(page.data)
    }

    async fn get_card(&self, id: i64) -> ClientResult<Value> {
        self.request_no_body(Method::GET, &format!("/api/card/{}", id)).await
    }

    async fn get_dashboard(&self, id: i64) -> ClientResult<Value> {
        self.request_no_body(Method::GET, &format!("/api/dashboard/{}", id)).await
    }

    async fn get_databases(&self) -> ClientResult<Value> {
        self.request_no_body(Method::GET, "/api/database").await
    }

    async fn get_database_metadata(&self, id: i64) -> ClientResult<Value> {
        self.request_no_body(Method::GET, &format!("/api/database/{}/metadata", id))
            .await
    }

    async fn create_card(&self, payload: &Value) -> ClientResult<i64> {
        self.created_id(Method::POST, "/api/card", payload).await
    }

    async fn update_card(&self, id: i64, payload: &Value) -> ClientResult<()> {
        self.request(Method::PUT, &format!("/api/card/{}", id), Some(payload)).await
    }

    async fn create_dashboard(&self, payload: &Value) -> ClientResult<i64> {
        self.created_id(Method::POST, "/api/dashboard", payload).await
    }

    async fn update_dashboard(&self, id: i64, payload: &Value) -> ClientResult<()> {
        self.request(Method::PUT, &format!("/api/dashboard/{}", id), Some(payload))
            .await
    }

    async fn create_collection(&self, payload: &Value) -> ClientResult<i64> {
        self.created_id(Method::POST, "/api/collection", payload).await
    }

    async fn update_collection(&self, id: i64, payload: &Value) -> ClientResult<()> {
        self.request(Method::PUT, &format!("/api/collection/{}", id), Some(payload))
            .await
    }

    async fn get_permissions_graph(&self) -> ClientResult<Value> {
        self.request_no_body(Method::GET, "/api/permissions/graph").await
    }

    async fn put_permissions_graph(&self, graph: &Value) -> ClientResult<()> {
        self.request(Method::PUT, "/api/permissions/graph", Some(graph)).await
    }

    async fn get_collection_permissions_graph(&self) -> ClientResult<Value> {
        self.request_no_body(Method::GET, "/api/collection/graph").await
    }

    async fn put_collection_permissions_graph(&self, graph: &Value) -> ClientResult<()> {
        self.request(Method::PUT, "/api/collection/graph", Some(graph)).await
    }
}
