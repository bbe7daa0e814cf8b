//! Permissions installer (spec §4.7). Two opaque graphs, each keyed by
//! group id at the top level (left untouched — group membership is not
//! reconciled) and by a permission-target key one level down, which is
//! the only thing rewritten.

use migrate_client::Client;
use migrate_model::{EntityKind, Report, ReportItem};
use serde_json::Value;

use crate::error::EngineResult;
use crate::import::resolver::IdentityResolver;

pub struct PermissionsInstaller;

impl PermissionsInstaller {
    pub async fn install(
        client: &dyn Client,
        permissions_graph: &Value,
        collection_permissions_graph: &Value,
        resolver: &IdentityResolver,
        report: &mut Report,
    ) -> EngineResult<()> {
        if !permissions_graph.is_null() {
            let rewritten = rewrite_graph(permissions_graph, resolver, false);
            client.put_permissions_graph(&rewritten).await?;
            report.push(ReportItem::updated(EntityKind::Permissions, 1, 1, "data-permissions"));
        }

        if !collection_permissions_graph.is_null() {
            let rewritten = rewrite_graph(collection_permissions_graph, resolver, true);
            client.put_collection_permissions_graph(&rewritten).await?;
            report.push(ReportItem::updated(EntityKind::Permissions, 2, 2, "collection-permissions"));
        }

        Ok(())
    }
}

/// Rewrite every group's permission-target keys. `is_collection_graph`
/// selects which id space numeric keys are resolved against, and keeps
/// the sentinel `"root"` key verbatim.
fn rewrite_graph(graph: &Value, resolver: &IdentityResolver, is_collection_graph: bool) -> Value {
    let mut rewritten = graph.clone();
    let Some(groups) = rewritten.get_mut("groups").and_then(Value::as_object_mut) else {
        return rewritten;
    };

    for (_group_id, group_entries) in groups.iter_mut() {
        let Some(entries) = group_entries.as_object() else { continue };

        let mut new_entries = serde_json::Map::new();
        for (key, value) in entries {
            if key == "root" && is_collection_graph {
                new_entries.insert(key.clone(), value.clone());
                continue;
            }
            match key.parse::<i64>() {
                Ok(source_id) => {
                    let resolved = if is_collection_graph {
                        resolver.resolve_collection(source_id)
                    } else {
                        resolver.resolve_database_id(source_id)
                    };
                    match resolved {
                        Some(target_id) => {
                            new_entries.insert(target_id.to_string(), value.clone());
                        }
                        None => {
                            new_entries.insert(key.clone(), value.clone());
                        }
                    }
                }
                Err(_) => {
                    new_entries.insert(key.clone(), value.clone());
                }
            }
        }
        *group_entries = Value::Object(new_entries);
    }

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeClient;
    use migrate_model::DatabaseMap;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn rewrites_numeric_database_keys_in_data_graph() {
        let client = FakeClient::new();
        let mut map = DatabaseMap::new();
        map.by_id.insert("1".to_string(), 100);
        let resolver = IdentityResolver::new(map, BTreeMap::new());
        let mut report = Report::new();

        let graph = json!({"groups": {"1": {"1": {"data": "all"}}}});
        let collection_graph = Value::Null;

        PermissionsInstaller::install(&client, &graph, &collection_graph, &resolver, &mut report).await.unwrap();

        let calls = client.put_permissions_graph_calls.lock().unwrap();
        assert_eq!(calls[0]["groups"]["1"]["100"], json!({"data": "all"}));
        assert_eq!(report.permissions.updated, 1);
    }

    #[tokio::test]
    async fn keeps_root_key_verbatim_in_collection_graph() {
        let client = FakeClient::new();
        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        resolver.register_collection(5, 50);
        let mut report = Report::new();

        let collection_graph = json!({"groups": {"1": {"root": "none", "5": "read"}}});
        PermissionsInstaller::install(&client, &Value::Null, &collection_graph, &resolver, &mut report).await.unwrap();

        assert_eq!(report.permissions.updated, 1);
    }

    #[test]
    fn rewrite_graph_preserves_root_and_rewrites_collection_id() {
        let mut resolver = IdentityResolver::new(DatabaseMap::new(), BTreeMap::new());
        resolver.register_collection(5, 50);
        let graph = json!({"groups": {"1": {"root": "none", "5": "read"}}});
        let rewritten = rewrite_graph(&graph, &resolver, true);
        let entries = &rewritten["groups"]["1"];
        assert_eq!(entries["root"], json!("none"));
        assert_eq!(entries["50"], json!("read"));
        assert!(entries.get("5").is_none());
    }
}
