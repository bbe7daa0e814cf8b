//! The export pipeline's threaded context value.
//!
//! The source keeps a web of back-references between exporters so each
//! can reach the others' bookkeeping; this crate replaces that with a
//! single owned [`ExportSession`] value passed by `&mut` reference to
//! each stage in turn (spec §9: "Shared mutable 'path map' across
//! exporters").

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use migrate_model::{Collection, Dashboard, DatabaseMetadata, PermissionGroup, Question};
use serde_json::Value;

/// Export-time options, sourced from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub include_archived: bool,
    pub include_dashboards: bool,
    pub include_permissions: bool,
    /// Limit the walk to these collection ids (and their descendants).
    /// `None` means export from the root.
    pub root_collection_ids: Option<Vec<i64>>,
    /// Personal collections owned by these user ids are included
    /// despite the default skip.
    pub include_personal_owner_ids: Vec<i64>,
}

/// Everything accumulated while exporting one package, and the output
/// directory it's being written to.
pub struct ExportSession {
    pub config: ExportConfig,
    pub export_root: PathBuf,

    /// Card ids already written to disk this run, whether in-scope or
    /// under `dependencies/` — the shared `exported` set from §4.1.
    pub exported: BTreeSet<i64>,
    /// Collection ids within export scope, mapped to their sanitized
    /// `/`-joined path. A collection absent from this map is
    /// out-of-scope (personal and not whitelisted, or outside
    /// `root_collection_ids`).
    pub collection_path_map: HashMap<i64, String>,

    pub databases: BTreeMap<i64, String>,
    pub database_metadata: BTreeMap<i64, DatabaseMetadata>,
    pub collections: Vec<Collection>,
    pub cards: Vec<Question>,
    pub dashboards: Vec<Dashboard>,
    pub permission_groups: Vec<PermissionGroup>,
    pub permissions_graph: Value,
    pub collection_permissions_graph: Value,

    /// One message per cycle detected during dependency discovery,
    /// recorded for the CLI's summary output (spec §4.1: "the exporter
    /// ... triggers a cycle warning").
    pub cycle_warnings: Vec<String>,
}

impl ExportSession {
    pub fn new(config: ExportConfig, export_root: PathBuf) -> Self {
        Self {
            config,
            export_root,
            exported: BTreeSet::new(),
            collection_path_map: HashMap::new(),
            databases: BTreeMap::new(),
            database_metadata: BTreeMap::new(),
            collections: Vec::new(),
            cards: Vec::new(),
            dashboards: Vec::new(),
            permission_groups: Vec::new(),
            permissions_graph: Value::Null,
            collection_permissions_graph: Value::Null,
            cycle_warnings: Vec::new(),
        }
    }

    /// `true` if `collection_id` is within export scope.
    pub fn is_in_scope(&self, collection_id: i64) -> bool {
        self.collection_path_map.contains_key(&collection_id)
    }

    /// The path to write a dependency-only card under, when its home
    /// collection is out of scope.
    pub fn dependencies_dir() -> &'static str {
        "dependencies"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_has_empty_bookkeeping() {
        let session = ExportSession::new(ExportConfig::default(), PathBuf::from("/tmp/export"));
        assert!(session.exported.is_empty());
        assert!(!session.is_in_scope(1));
    }

    #[test]
    fn is_in_scope_reflects_path_map() {
        let mut session = ExportSession::new(ExportConfig::default(), PathBuf::from("/tmp/export"));
        session.collection_path_map.insert(5, "Analytics".to_string());
        assert!(session.is_in_scope(5));
        assert!(!session.is_in_scope(6));
    }
}
