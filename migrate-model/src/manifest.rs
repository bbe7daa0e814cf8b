//! `manifest.json` and `db_map.json` wire formats.
//!
//! The manifest's integer-keyed maps (`databases`, `database_metadata`)
//! are forced to string keys on the wire by JSON; this module is the one
//! place that converts between the two, so the in-memory model can use
//! integer keys throughout (spec §9, "String keys for integer-keyed
//! maps").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Collection, Dashboard, DatabaseMetadata, PermissionGroup, Question};

/// Serde helper module for `BTreeMap<i64, V>` fields that must round-trip
/// through JSON's string-keyed object representation.
pub mod int_key_map {
    use super::*;
    use serde::de::{Deserializer, Error as DeError};
    use serde::ser::Serializer;

    pub fn serialize<S, V>(map: &BTreeMap<i64, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let stringified: BTreeMap<String, &V> =
            map.iter().map(|(k, v)| (k.to_string(), v)).collect();
        stringified.serialize(serializer)
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<i64, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let stringified: BTreeMap<String, V> = BTreeMap::deserialize(deserializer)?;
        stringified
            .into_iter()
            .map(|(k, v)| {
                k.parse::<i64>()
                    .map(|id| (id, v))
                    .map_err(|_| DeError::custom(format!("non-integer manifest key `{}`", k)))
            })
            .collect()
    }
}

/// Metadata recorded once at export time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMeta {
    pub source_url: String,
    /// ISO-8601 UTC export timestamp.
    pub export_timestamp: chrono::DateTime<chrono::Utc>,
    pub tool_version: String,
    /// The invocation's CLI args, with credential-bearing flag values
    /// redacted to `***`.
    #[serde(default)]
    pub cli_args: Vec<String>,
}

/// The full export package manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub meta: ManifestMeta,

    #[serde(with = "int_key_map")]
    pub databases: BTreeMap<i64, String>,

    #[serde(with = "int_key_map")]
    pub database_metadata: BTreeMap<i64, DatabaseMetadata>,

    #[serde(default)]
    pub collections: Vec<Collection>,

    #[serde(default)]
    pub cards: Vec<Question>,

    #[serde(default)]
    pub dashboards: Vec<Dashboard>,

    #[serde(default)]
    pub permission_groups: Vec<PermissionGroup>,

    #[serde(default)]
    pub permissions_graph: serde_json::Value,

    #[serde(default)]
    pub collection_permissions_graph: serde_json::Value,
}

impl Manifest {
    /// Find a card's index record by source id, searching both in-scope
    /// cards and nothing else — the `dependencies/` bucket cards are
    /// also represented in `cards`, just with a path under
    /// `dependencies/`.
    pub fn find_card(&self, id: i64) -> Option<&Question> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn find_dashboard(&self, id: i64) -> Option<&Dashboard> {
        self.dashboards.iter().find(|d| d.id == id)
    }

    pub fn find_collection(&self, id: i64) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }
}

/// User-authored `db_map.json`: the explicit source-to-target database
/// handle mapping. `by_id` wins over `by_name` when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseMap {
    #[serde(default)]
    pub by_id: BTreeMap<String, i64>,
    #[serde(default)]
    pub by_name: BTreeMap<String, i64>,
}

impl DatabaseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a source database id to a target id using only the
    /// locally-available map (no manifest name lookup — that's
    /// `IdentityResolver::resolve_database`'s job once it also has the
    /// manifest's id→name table).
    pub fn resolve_by_id(&self, source_id: i64) -> Option<i64> {
        self.by_id.get(&source_id.to_string()).copied()
    }

    pub fn resolve_by_name(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_int_keyed_databases_round_trip() {
        let mut databases = BTreeMap::new();
        databases.insert(1, "Sales DB".to_string());
        databases.insert(2, "Warehouse".to_string());

        let manifest = Manifest {
            meta: ManifestMeta {
                source_url: "https://source.example.com".into(),
                export_timestamp: chrono::Utc::now(),
                tool_version: "0.1.0".into(),
                cli_args: vec!["export".into()],
            },
            databases,
            database_metadata: BTreeMap::new(),
            collections: vec![],
            cards: vec![],
            dashboards: vec![],
            permission_groups: vec![],
            permissions_graph: serde_json::Value::Null,
            collection_permissions_graph: serde_json::Value::Null,
        };

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["databases"]["1"], serde_json::json!("Sales DB"));

        let back: Manifest = serde_json::from_value(json).unwrap();
        assert_eq!(back.databases.get(&1), Some(&"Sales DB".to_string()));
        assert_eq!(back.databases.get(&2), Some(&"Warehouse".to_string()));
    }

    #[test]
    fn non_integer_key_is_rejected() {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "int_key_map")] BTreeMap<i64, String>);

        let wrapped: Result<Wrapper, _> =
            serde_json::from_value(serde_json::json!({"abc": "oops"}));
        assert!(wrapped.is_err());
    }

    #[test]
    fn db_map_by_id_resolves() {
        let mut map = DatabaseMap::new();
        map.by_id.insert("7".to_string(), 100);
        assert_eq!(map.resolve_by_id(7), Some(100));
        assert_eq!(map.resolve_by_id(8), None);
    }

    #[test]
    fn db_map_by_name_resolves() {
        let mut map = DatabaseMap::new();
        map.by_name.insert("Sales DB".to_string(), 100);
        assert_eq!(map.resolve_by_name("Sales DB"), Some(100));
    }
}
