//! Entity types shared by the export and import pipelines.
//!
//! These mirror the essential attributes named in the data model: a
//! database's captured table/field metadata, a collection's place in the
//! forest, and the index records kept for questions and dashboards
//! (their full payload lives on disk, not in memory).

use serde::{Deserialize, Serialize};

/// A field captured from a source database's table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub id: i64,
    pub name: String,
}

/// A table captured from a source database's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

/// Per-database table/field metadata, captured once at export start and
/// never mutated afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    #[serde(default)]
    pub tables: Vec<TableInfo>,
}

/// A source database, as captured by the `DatabaseSnapshotter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    pub name: String,
}

/// A collection discovered by the `CollectionWalker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_owner_id: Option<i64>,
    /// `/`-joined sanitized name chain, rooted at the export scope
    /// boundary. Unique within the package.
    pub path: String,
}

impl Collection {
    pub fn is_personal(&self) -> bool {
        self.personal_owner_id.is_some()
    }
}

/// A question (card) index record. The full payload lives at
/// `file_path`, checksummed against `checksum`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<i64>,
    pub database_id: i64,
    pub file_path: String,
    pub checksum: String,
    #[serde(default)]
    pub archived: bool,
    /// Whether this question is flagged as a reusable model. The wire
    /// field is `dataset` for compatibility with the source format.
    #[serde(default, rename = "dataset")]
    pub is_model: bool,
}

/// A dashboard index record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<i64>,
    /// Source ids of every question referenced by this dashboard's
    /// panels, in panel order.
    pub ordered_cards: Vec<i64>,
    pub file_path: String,
    pub checksum: String,
    #[serde(default)]
    pub archived: bool,
}

/// A permission group, captured verbatim (not reconciled on import).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub id: i64,
    pub name: String,
    pub member_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_dataset_field_round_trips_as_is_model() {
        let json = serde_json::json!({
            "id": 50,
            "name": "Filtered Orders",
            "database_id": 1,
            "file_path": "cards/card_50_filtered_orders.json",
            "checksum": "abc123",
            "dataset": true,
        });
        let q: Question = serde_json::from_value(json).unwrap();
        assert!(q.is_model);
        let back = serde_json::to_value(&q).unwrap();
        assert_eq!(back["dataset"], serde_json::json!(true));
    }

    #[test]
    fn collection_is_personal_reflects_owner() {
        let c = Collection {
            id: 1,
            name: "My Stuff".into(),
            slug: "my_stuff".into(),
            description: None,
            parent_id: None,
            personal_owner_id: Some(7),
            path: "My_Stuff".into(),
        };
        assert!(c.is_personal());
    }
}
