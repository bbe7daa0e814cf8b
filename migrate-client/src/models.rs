//! Wire shapes for the parts of the administration API the client
//! surfaces as typed values rather than opaque JSON. Card and dashboard
//! payloads stay as `serde_json::Value` — `migrate-query`'s rewriter
//! operates on them structurally and typing them fully would just
//! duplicate the platform's own schema.

use serde::{Deserialize, Serialize};

/// A collection id, which the API also accepts as the literal string
/// `"root"` to mean the top of the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CollectionId {
    Root,
    Id(i64),
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionId::Root => write!(f, "root"),
            CollectionId::Id(id) => write!(f, "{}", id),
        }
    }
}

impl<'de> Deserialize<'de> for CollectionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) if s == "root" => Ok(CollectionId::Root),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(CollectionId::Id)
                .ok_or_else(|| serde::de::Error::custom("collection id is not an integer")),
            other => Err(serde::de::Error::custom(format!(
                "unexpected collection id shape: {other}"
            ))),
        }
    }
}

/// One node of the collections forest returned by
/// `get_collections_tree`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNode {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub personal_owner_id: Option<i64>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub children: Vec<CollectionNode>,
}

/// Which item kinds to request from `get_collection_items`.
#[derive(Debug, Clone, Default)]
pub struct ItemsQuery {
    pub models: Vec<String>,
    pub archived: bool,
}

/// One entry in a collection's item listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionItem {
    pub id: i64,
    pub model: String,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

impl CollectionItem {
    pub fn is_question_or_model(&self) -> bool {
        self.model == "card" || self.model == "dataset"
    }

    pub fn is_dashboard(&self) -> bool {
        self.model == "dashboard"
    }
}
