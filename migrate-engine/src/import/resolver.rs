//! The import pipeline's single owned identifier-resolution state
//! (spec §9: "Mutable, lazily built resolver tables ... model as a
//! single owned value"). Implements [`migrate_query::Resolver`] so the
//! rewriter can observe it immutably while the installers are the only
//! code that mutates it.

use std::collections::{BTreeMap, HashMap};

use migrate_model::DatabaseMap;
use migrate_query::Resolver;

/// `resolveDatabase`/`resolveCollection`/`resolveQuestion` state (spec
/// §4.2), built once at validation time and then incrementally
/// populated by the collection and question installers.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    db_map: DatabaseMap,
    /// Source database id -> name, from the manifest, used for
    /// `by_name` fallback resolution.
    manifest_databases: BTreeMap<i64, String>,

    table_map: HashMap<(i64, i64), i64>,
    field_map: HashMap<(i64, i64), i64>,
    collection_map: HashMap<i64, i64>,
    question_map: HashMap<i64, i64>,

    /// Tables/fields present in the manifest but absent by name from
    /// the target database's metadata — recorded for the schema-drift
    /// warning, never fatal on its own (spec §7: "warned during map
    /// construction").
    drift_warnings: Vec<String>,
}

impl IdentityResolver {
    pub fn new(db_map: DatabaseMap, manifest_databases: BTreeMap<i64, String>) -> Self {
        Self {
            db_map,
            manifest_databases,
            ..Default::default()
        }
    }

    /// `resolveDatabase(srcId)`: prefer `by_id`, then `by_name` via the
    /// manifest's recorded name.
    pub fn resolve_database_id(&self, source_db_id: i64) -> Option<i64> {
        if let Some(target) = self.db_map.resolve_by_id(source_db_id) {
            return Some(target);
        }
        let name = self.manifest_databases.get(&source_db_id)?;
        self.db_map.resolve_by_name(name)
    }

    pub fn register_table(&mut self, source_db_id: i64, source_table_id: i64, target_table_id: i64) {
        self.table_map.entry((source_db_id, source_table_id)).or_insert(target_table_id);
    }

    pub fn register_field(&mut self, source_db_id: i64, source_field_id: i64, target_field_id: i64) {
        self.field_map.entry((source_db_id, source_field_id)).or_insert(target_field_id);
    }

    /// Register a newly (or previously) installed collection's target
    /// id. Never replaces an existing entry (spec invariant: "resolver
    /// monotonicity").
    pub fn register_collection(&mut self, source_collection_id: i64, target_id: i64) {
        self.collection_map.entry(source_collection_id).or_insert(target_id);
    }

    pub fn resolve_collection(&self, source_collection_id: i64) -> Option<i64> {
        self.collection_map.get(&source_collection_id).copied()
    }

    /// Register a newly installed question's target id.
    pub fn register_question(&mut self, source_question_id: i64, target_id: i64) {
        self.question_map.entry(source_question_id).or_insert(target_id);
    }

    pub fn note_drift(&mut self, message: String) {
        self.drift_warnings.push(message);
    }

    pub fn drift_warnings(&self) -> &[String] {
        &self.drift_warnings
    }
}

impl Resolver for IdentityResolver {
    fn resolve_database(&self, source_db_id: i64) -> Option<i64> {
        self.resolve_database_id(source_db_id)
    }

    fn resolve_table(&self, source_db_id: i64, source_table_id: i64) -> Option<i64> {
        self.table_map.get(&(source_db_id, source_table_id)).copied()
    }

    fn resolve_field(&self, source_db_id: i64, source_field_id: i64) -> Option<i64> {
        self.field_map.get(&(source_db_id, source_field_id)).copied()
    }

    fn resolve_question(&self, source_question_id: i64) -> Option<i64> {
        self.question_map.get(&source_question_id).copied()
    }
}
