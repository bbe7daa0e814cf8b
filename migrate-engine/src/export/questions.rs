//! Transitive dependency discovery and writing for questions (spec
//! §4.1). A depth-first walk shares one `exported` set across the whole
//! run and carries a per-invocation chain to detect cycles; a node
//! already on the chain is a back edge and is skipped rather than
//! followed, so the walk always terminates.

use std::future::Future;
use std::pin::Pin;

use migrate_client::Client;
use migrate_model::{checksum, sanitize, Question};
use migrate_query::{ReferenceCatalog, StandardCatalog};
use serde_json::Value;

use crate::error::EngineResult;
use crate::export::session::ExportSession;

pub struct QuestionExporter;

impl QuestionExporter {
    /// Export `id` and, transitively, every question it references.
    pub async fn export_question(client: &dyn Client, session: &mut ExportSession, id: i64, chain: &mut Vec<i64>) -> EngineResult<()> {
        export_question_inner(client, session, id, chain).await
    }
}

fn export_question_inner<'a>(
    client: &'a dyn Client,
    session: &'a mut ExportSession,
    id: i64,
    chain: &'a mut Vec<i64>,
) -> Pin<Box<dyn Future<Output = EngineResult<()>> + 'a>> {
    Box::pin(async move {
        if session.exported.contains(&id) {
            return Ok(());
        }
        if chain.contains(&id) {
            session
                .cycle_warnings
                .push(format!("cycle detected: question {id} references an ancestor already being exported"));
            return Ok(());
        }

        let payload = client.get_card(id).await?;
        if payload.is_null() {
            tracing::warn!(question_id = id, "referenced question not found on source; skipping");
            return Ok(());
        }

        chain.push(id);

        let dataset_query = payload.get("dataset_query").cloned().unwrap_or(Value::Null);
        let dependencies = StandardCatalog.extract_dependencies(&dataset_query);
        for dep_id in dependencies {
            if dep_id != id {
                export_question_inner(client, session, dep_id, chain).await?;
            }
        }

        write_question(session, id, &payload)?;
        session.exported.insert(id);
        chain.pop();
        Ok(())
    })
}

fn write_question(session: &mut ExportSession, id: i64, payload: &Value) -> EngineResult<()> {
    let name = payload.get("name").and_then(Value::as_str).unwrap_or("untitled").to_string();
    let collection_id = payload.get("collection_id").and_then(Value::as_i64);
    let database_id = payload
        .get("database_id")
        .and_then(Value::as_i64)
        .or_else(|| payload.get("dataset_query").and_then(|dq| dq.get("database")).and_then(Value::as_i64))
        .unwrap_or_default();
    let archived = payload.get("archived").and_then(Value::as_bool).unwrap_or(false);
    let is_model = payload.get("dataset").and_then(Value::as_bool).unwrap_or(false);

    let (base_dir, recorded_collection_id) = match collection_id {
        Some(cid) if session.is_in_scope(cid) => (session.collection_path_map[&cid].clone(), Some(cid)),
        _ => (ExportSession::dependencies_dir().to_string(), None),
    };

    let file_name = sanitize::card_file_name(id, &name);
    let relative_path = format!("{base_dir}/cards/{file_name}");
    let full_path = session.export_root.join(&relative_path);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| crate::error::EngineError::other(format!("creating {}: {e}", parent.display())))?;
    }

    let mut bytes = serde_json::to_vec_pretty(payload).map_err(|e| crate::error::EngineError::other(e.to_string()))?;
    bytes.push(b'\n');
    std::fs::write(&full_path, &bytes).map_err(|e| crate::error::EngineError::other(format!("writing {}: {e}", full_path.display())))?;
    let checksum = checksum::checksum_bytes(&bytes);

    session.cards.push(Question {
        id,
        name,
        collection_id: recorded_collection_id,
        database_id,
        file_path: relative_path,
        checksum,
        archived,
        is_model,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::session::{ExportConfig, ExportSession};
    use crate::testutil::FakeClient;
    use serde_json::json;

    fn session_in(dir: &std::path::Path) -> ExportSession {
        let mut session = ExportSession::new(ExportConfig::default(), dir.to_path_buf());
        session.collection_path_map.insert(1, "Analytics".to_string());
        session
    }

    #[tokio::test]
    async fn exports_single_question_with_no_dependencies() {
        let tmp = tempfile::tempdir().unwrap();
        let mut client = FakeClient::new();
        client.cards.insert(
            50,
            json!({ "id": 50, "name": "Orders", "collection_id": 1, "database_id": 1, "dataset_query": {"database": 1, "query": {}} }),
        );

        let mut session = session_in(tmp.path());
        let mut chain = Vec::new();
        QuestionExporter::export_question(&client, &mut session, 50, &mut chain).await.unwrap();

        assert!(session.exported.contains(&50));
        assert_eq!(session.cards.len(), 1);
        assert!(tmp.path().join("Analytics/cards").exists());
    }

    #[tokio::test]
    async fn transitive_model_dependency_is_exported_to_scope_collection() {
        let tmp = tempfile::tempdir().unwrap();
        let mut client = FakeClient::new();
        client.cards.insert(
            100,
            json!({ "id": 100, "name": "A", "collection_id": 1, "database_id": 1,
                    "dataset_query": {"database": 1, "query": {"source-table": "card__50"}} }),
        );
        client.cards.insert(
            50,
            json!({ "id": 50, "name": "B", "collection_id": 1, "database_id": 1, "dataset": true,
                    "dataset_query": {"database": 1, "query": {}} }),
        );

        let mut session = session_in(tmp.path());
        let mut chain = Vec::new();
        QuestionExporter::export_question(&client, &mut session, 100, &mut chain).await.unwrap();

        assert!(session.exported.contains(&100));
        assert!(session.exported.contains(&50));
        assert_eq!(session.cards.len(), 2);
    }

    #[tokio::test]
    async fn dependency_outside_scope_lands_under_dependencies_bucket() {
        let tmp = tempfile::tempdir().unwrap();
        let mut client = FakeClient::new();
        client.cards.insert(
            100,
            json!({ "id": 100, "name": "A", "collection_id": 1, "database_id": 1,
                    "dataset_query": {"database": 1, "query": {"source-table": "card__50"}} }),
        );
        client.cards.insert(
            50,
            json!({ "id": 50, "name": "B", "collection_id": 99, "database_id": 1,
                    "dataset_query": {"database": 1, "query": {}} }),
        );

        let mut session = session_in(tmp.path());
        let mut chain = Vec::new();
        QuestionExporter::export_question(&client, &mut session, 100, &mut chain).await.unwrap();

        let b = session.cards.iter().find(|c| c.id == 50).unwrap();
        assert!(b.file_path.starts_with("dependencies/"));
        assert!(b.collection_id.is_none());
    }

    #[tokio::test]
    async fn cycle_is_detected_and_does_not_infinitely_recurse() {
        let tmp = tempfile::tempdir().unwrap();
        let mut client = FakeClient::new();
        client.cards.insert(
            1,
            json!({ "id": 1, "name": "A", "collection_id": 1, "database_id": 1,
                    "dataset_query": {"database": 1, "query": {"source-table": "card__2"}} }),
        );
        client.cards.insert(
            2,
            json!({ "id": 2, "name": "B", "collection_id": 1, "database_id": 1,
                    "dataset_query": {"database": 1, "query": {"source-table": "card__1"}} }),
        );

        let mut session = session_in(tmp.path());
        let mut chain = Vec::new();
        QuestionExporter::export_question(&client, &mut session, 1, &mut chain).await.unwrap();

        assert!(session.exported.contains(&1));
        assert!(session.exported.contains(&2));
        assert_eq!(session.cycle_warnings.len(), 1);
    }
}
