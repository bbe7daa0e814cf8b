//! The reference-shape catalog shared by export-side dependency discovery
//! and import-side rewriting (spec §4.1/§4.4/§9: "export-side discovery and
//! import-side rewriting share the same shape catalog, declared once").
//!
//! A question payload embeds references to other questions in a handful of
//! well-known shapes. [`RefShape`] names them; [`ReferenceCatalog`] is the
//! trait object both the exporter and the rewriter hold so neither
//! reimplements shape recognition.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::Value;

use crate::dialect::Dialect;

/// A recognized shape a query-tree node may take, per spec §9's suggested
/// sum type (`Field | SourceTable | CardRef | TemplateTagCardRef | Other`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefShape {
    /// `["field", id, opts]` or the legacy two-element `["field-id", id]`.
    Field { id: i64 },
    /// An integer `source-table`, naming a physical table.
    SourceTable { table_id: i64 },
    /// A `source-table` of the form `"card__<id>"`, or a `stages[*]` entry
    /// of the same shape — references another question.
    CardRef { card_id: i64 },
    /// A `template-tags` entry with `type: "card"`.
    TemplateTagCardRef { key: String, card_id: i64 },
    /// Any node the catalog doesn't recognize; passed through unchanged by
    /// the rewriter to preserve forward compatibility with unknown shapes.
    Other,
}

fn card_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^card__(\d+)$").unwrap())
}

/// The regex used to find `{{#<id>-<slug>}}` template-tag references
/// embedded in native SQL text (spec §4.3).
pub fn template_tag_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{#(\d+)-([^}]*)\}\}").unwrap())
}

/// Classify a `source-table` value (either dialect).
pub fn classify_source_table(value: &Value) -> RefShape {
    match value {
        Value::Number(n) => {
            if let Some(table_id) = n.as_i64() {
                RefShape::SourceTable { table_id }
            } else {
                RefShape::Other
            }
        }
        Value::String(s) => match card_ref_re().captures(s) {
            Some(caps) => match caps[1].parse::<i64>() {
                Ok(card_id) => RefShape::CardRef { card_id },
                Err(_) => RefShape::Other,
            },
            None => RefShape::Other,
        },
        _ => RefShape::Other,
    }
}

/// Parse a template-tag key that encodes a card id: `<n>-slug` or
/// `#<n>-slug`. Returns `(has_hash_prefix, id, slug)`.
pub fn parse_template_tag_key(key: &str) -> Option<(bool, i64, &str)> {
    let (hash, rest) = match key.strip_prefix('#') {
        Some(rest) => (true, rest),
        None => (false, key),
    };
    let (id_part, slug) = rest.split_once('-')?;
    let id = id_part.parse::<i64>().ok()?;
    Some((hash, id, slug))
}

/// A shared shape-recognition surface used by both the exporter's
/// dependency walker and the rewriter's structural walk.
pub trait ReferenceCatalog {
    /// Every question id directly or indirectly referenced by `payload`'s
    /// `dataset_query` (source-table refs, join refs, and native
    /// template-tag card refs — both in the SQL text and in the
    /// `template-tags` map).
    fn extract_dependencies(&self, dataset_query: &Value) -> BTreeSet<i64>;
}

/// The catalog implementation used throughout the workspace. A unit struct
/// since shape recognition carries no state of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCatalog;

impl ReferenceCatalog for StandardCatalog {
    fn extract_dependencies(&self, dataset_query: &Value) -> BTreeSet<i64> {
        let mut deps = BTreeSet::new();
        match Dialect::detect(dataset_query) {
            Dialect::Legacy => {
                if let Some(query) = dataset_query.get("query") {
                    collect_mbql_card_refs(query, &mut deps);
                }
            }
            Dialect::StageBased => {
                if let Some(stages) = dataset_query.get("stages").and_then(Value::as_array) {
                    for stage in stages {
                        collect_mbql_card_refs(stage, &mut deps);
                        collect_native_template_tag_refs(stage, "native", &mut deps);
                    }
                }
            }
        }
        if let Some(native) = dataset_query.get("native") {
            collect_native_template_tag_refs(native, "query", &mut deps);
        }
        deps
    }
}

fn collect_mbql_card_refs(node: &Value, deps: &mut BTreeSet<i64>) {
    if let Some(source_table) = node.get("source-table") {
        if let RefShape::CardRef { card_id } = classify_source_table(source_table) {
            deps.insert(card_id);
        }
    }
    if let Some(joins) = node.get("joins").and_then(Value::as_array) {
        for join in joins {
            collect_mbql_card_refs(join, deps);
        }
    }
}

/// Scan a native-query container for card references. `sql_key` names
/// where the raw SQL text lives: `"query"` for the legacy
/// `dataset_query.native.{query, template-tags}` shape, `"native"` for a
/// stage-based native stage, where the SQL text is the stage's own
/// `native` field and `template-tags` is a sibling key.
fn collect_native_template_tag_refs(container: &Value, sql_key: &str, deps: &mut BTreeSet<i64>) {
    if let Some(sql) = container.get(sql_key).and_then(Value::as_str) {
        for caps in template_tag_text_re().captures_iter(sql) {
            if let Ok(id) = caps[1].parse::<i64>() {
                deps.insert(id);
            }
        }
    }
    if let Some(tags) = container.get("template-tags").and_then(Value::as_object) {
        for tag in tags.values() {
            if tag.get("type").and_then(Value::as_str) == Some("card") {
                if let Some(card_id) = tag.get("card-id").and_then(Value::as_i64) {
                    deps.insert(card_id);
                }
            }
        }
    }
}
