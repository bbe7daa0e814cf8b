//! Captures source database and table/field metadata once, at export
//! start. Never mutated afterward.

use migrate_client::Client;
use migrate_model::{DatabaseMetadata, FieldInfo, TableInfo};

use crate::error::{EngineError, EngineResult};
use crate::export::session::ExportSession;

pub struct DatabaseSnapshotter;

impl DatabaseSnapshotter {
    /// Fetch the list of databases and, for each, its table/field
    /// metadata, recording both into the session.
    pub async fn snapshot(client: &dyn Client, session: &mut ExportSession) -> EngineResult<()> {
        let databases = client.get_databases().await?;
        let entries = databases
            .get("data")
            .and_then(|v| v.as_array())
            .or_else(|| databases.as_array())
            .ok_or_else(|| EngineError::other("get_databases response missing a database list"))?;

        for entry in entries {
            let id = entry
                .get("id")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| EngineError::other("database entry missing `id`"))?;
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            session.databases.insert(id, name);

            let metadata = client.get_database_metadata(id).await?;
            session.database_metadata.insert(id, parse_metadata(&metadata));
        }

        Ok(())
    }
}

fn parse_metadata(value: &serde_json::Value) -> DatabaseMetadata {
    let tables = value
        .get("tables")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|t| {
                    let id = t.get("id")?.as_i64()?;
                    let name = t.get("name")?.as_str()?.to_string();
                    let fields = t
                        .get("fields")
                        .and_then(|v| v.as_array())
                        .map(|fs| {
                            fs.iter()
                                .filter_map(|f| {
                                    let fid = f.get("id")?.as_i64()?;
                                    let fname = f.get("name")?.as_str()?.to_string();
                                    Some(FieldInfo { id: fid, name: fname })
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    Some(TableInfo { id, name, fields })
                })
                .collect()
        })
        .unwrap_or_default();
    DatabaseMetadata { tables }
}
