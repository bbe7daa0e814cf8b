//! Captures the two opaque permission graphs and the permission group
//! roster, verbatim. Group membership is not reconciled (spec §4.7,
//! out of scope).

use migrate_client::Client;
use migrate_model::PermissionGroup;
use serde_json::Value;

use crate::error::EngineResult;
use crate::export::session::ExportSession;

pub struct PermissionsSnapshotter;

impl PermissionsSnapshotter {
    pub async fn snapshot(client: &dyn Client, session: &mut ExportSession) -> EngineResult<()> {
        session.permissions_graph = client.get_permissions_graph().await?;
        session.collection_permissions_graph = client.get_collection_permissions_graph().await?;

        if let Some(groups) = session.permissions_graph.get("groups").and_then(Value::as_object) {
            for (key, _) in groups {
                if let Ok(id) = key.parse::<i64>() {
                    if !session.permission_groups.iter().any(|g| g.id == id) {
                        session.permission_groups.push(PermissionGroup {
                            id,
                            name: format!("group-{id}"),
                            member_count: 0,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
