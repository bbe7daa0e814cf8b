//! The central query-tree rewriter (spec §4.3).
//!
//! [`rewrite_question`] is a pure, idempotent function over a question
//! payload: given a resolver that can translate source identifiers to
//! target ones, it rewrites every recognized reference shape in place and
//! reports which identifiers it could not resolve. It never fails the run
//! itself — unresolvable identifiers are left intact and recorded; only the
//! installer decides whether that makes the item a failure.

use serde_json::Value;

use crate::refs::{classify_source_table, parse_template_tag_key, template_tag_text_re, RefShape};

/// Source-to-target identifier lookups the rewriter needs. Implemented by
/// the import pipeline's resolver state; the rewriter only ever observes
/// it, never mutates it.
pub trait Resolver {
    fn resolve_database(&self, source_db_id: i64) -> Option<i64>;
    fn resolve_table(&self, source_db_id: i64, source_table_id: i64) -> Option<i64>;
    fn resolve_field(&self, source_db_id: i64, source_field_id: i64) -> Option<i64>;
    fn resolve_question(&self, source_question_id: i64) -> Option<i64>;
}

/// Tally of identifiers the rewriter could not resolve, plus whether a
/// database reference was found and rewritten at all.
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    /// The resolved target database id, if the payload carried one.
    pub target_database_id: Option<i64>,
    pub unresolved_tables: Vec<i64>,
    pub unresolved_fields: Vec<i64>,
    pub unresolved_cards: Vec<i64>,
    /// `true` when a database reference was present and resolved
    /// (spec §4.3: "(payload', true) on success, (payload, false) when no
    /// database reference exists").
    pub ok: bool,
}

impl RewriteReport {
    fn unresolved() -> Self {
        Self::default()
    }

    /// Whether the rewrite is clean: a database was resolved and every
    /// identifier inside the tree mapped to a target.
    pub fn is_fully_resolved(&self) -> bool {
        self.ok
            && self.unresolved_tables.is_empty()
            && self.unresolved_fields.is_empty()
            && self.unresolved_cards.is_empty()
    }
}

/// Rewrite a single question payload in place against `resolver`.
///
/// `payload` is the full card JSON object as read from disk or fetched
/// from the source. The rewriter reads the source database id from
/// `database_id` (falling back to `dataset_query.database`), resolves it,
/// and threads it through every nested lookup that depends on database
/// context (table and field maps are keyed by source database).
pub fn rewrite_question(payload: &mut Value, resolver: &dyn Resolver) -> RewriteReport {
    let Some(source_db) = read_source_database_id(payload) else {
        return RewriteReport::unresolved();
    };

    let Some(target_db) = resolver.resolve_database(source_db) else {
        tracing::error!(source_db, "database id present but unresolved at rewrite time");
        return RewriteReport::unresolved();
    };

    let mut report = RewriteReport {
        target_database_id: Some(target_db),
        ok: true,
        ..Default::default()
    };

    payload["database_id"] = Value::from(target_db);

    if payload.get("table_id").is_some() {
        rewrite_table_ref(payload, "table_id", source_db, resolver, &mut report);
    }

    if let Some(dataset_query) = payload.get_mut("dataset_query") {
        dataset_query["database"] = Value::from(target_db);
        rewrite_dataset_query(dataset_query, source_db, resolver, &mut report);
    }

    if let Some(result_metadata) = payload.get_mut("result_metadata").and_then(Value::as_array_mut)
    {
        for field in result_metadata.iter_mut() {
            rewrite_result_metadata_entry(field, source_db, resolver, &mut report);
        }
    }

    if let Some(viz) = payload.get_mut("visualization_settings") {
        rewrite_field_refs(viz, source_db, resolver, &mut report);
    }

    report
}

fn read_source_database_id(payload: &Value) -> Option<i64> {
    payload
        .get("database_id")
        .and_then(Value::as_i64)
        .or_else(|| {
            payload
                .get("dataset_query")
                .and_then(|dq| dq.get("database"))
                .and_then(Value::as_i64)
        })
}

fn rewrite_table_ref(
    node: &mut Value,
    key: &str,
    source_db: i64,
    resolver: &dyn Resolver,
    report: &mut RewriteReport,
) {
    let Some(table_id) = node.get(key).and_then(Value::as_i64) else {
        return;
    };
    match resolver.resolve_table(source_db, table_id) {
        Some(target) => node[key] = Value::from(target),
        None => report.unresolved_tables.push(table_id),
    }
}

fn rewrite_dataset_query(
    dataset_query: &mut Value,
    source_db: i64,
    resolver: &dyn Resolver,
    report: &mut RewriteReport,
) {
    match crate::dialect::Dialect::detect(dataset_query) {
        crate::dialect::Dialect::Legacy => {
            if let Some(query) = dataset_query.get_mut("query") {
                rewrite_mbql_node(query, source_db, resolver, report);
            }
            if let Some(native) = dataset_query.get_mut("native") {
                rewrite_native(native, "query", resolver, report);
            }
        }
        crate::dialect::Dialect::StageBased => {
            if let Some(stages) = dataset_query.get_mut("stages").and_then(Value::as_array_mut) {
                for stage in stages.iter_mut() {
                    let is_native = stage
                        .get("lib/type")
                        .and_then(Value::as_str)
                        .map(|t| t.contains("native"))
                        .unwrap_or(false);
                    if is_native {
                        rewrite_native(stage, "native", resolver, report);
                    } else {
                        rewrite_mbql_node(stage, source_db, resolver, report);
                    }
                }
            }
        }
    }
}

/// Rewrite `source-table` at this node and every direct join, then
/// recursively rewrite every `["field", id, opts]` / `["field-id", id]`
/// leaf anywhere underneath — including inside joins' own clauses, since
/// a single pass over the whole subtree covers both.
fn rewrite_mbql_node(
    node: &mut Value,
    source_db: i64,
    resolver: &dyn Resolver,
    report: &mut RewriteReport,
) {
    rewrite_source_table(node, source_db, resolver, report);
    if let Some(joins) = node.get_mut("joins").and_then(Value::as_array_mut) {
        for join in joins.iter_mut() {
            rewrite_source_table(join, source_db, resolver, report);
        }
    }
    rewrite_field_refs(node, source_db, resolver, report);
}

fn rewrite_source_table(
    node: &mut Value,
    source_db: i64,
    resolver: &dyn Resolver,
    report: &mut RewriteReport,
) {
    let Some(source_table) = node.get("source-table").cloned() else {
        return;
    };
    match classify_source_table(&source_table) {
        RefShape::SourceTable { table_id } => match resolver.resolve_table(source_db, table_id) {
            Some(target) => node["source-table"] = Value::from(target),
            None => report.unresolved_tables.push(table_id),
        },
        RefShape::CardRef { card_id } => match resolver.resolve_question(card_id) {
            Some(target) => node["source-table"] = Value::String(format!("card__{}", target)),
            None => report.unresolved_cards.push(card_id),
        },
        _ => {}
    }
}

/// Recursively replace every `["field", id, opts]` or legacy
/// `["field-id", id]` leaf with its resolved target field id. Leaves
/// without a mapping are left intact and recorded (spec §4.3).
fn rewrite_field_refs(value: &mut Value, source_db: i64, resolver: &dyn Resolver, report: &mut RewriteReport) {
    match value {
        Value::Array(items) => {
            let is_field_ref = matches!(
                items.first().and_then(Value::as_str),
                Some("field") | Some("field-id")
            );
            if is_field_ref {
                if let Some(id_slot) = items.get_mut(1) {
                    if let Some(field_id) = id_slot.as_i64() {
                        match resolver.resolve_field(source_db, field_id) {
                            Some(target) => *id_slot = Value::from(target),
                            None => report.unresolved_fields.push(field_id),
                        }
                    }
                }
                return;
            }
            for item in items.iter_mut() {
                rewrite_field_refs(item, source_db, resolver, report);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                rewrite_field_refs(v, source_db, resolver, report);
            }
        }
        _ => {}
    }
}

/// Rewrite every `["field", id, opts]` / `["field-id", id]` node found
/// anywhere under `value` against `source_db`'s field map. Shared by the
/// dashboard installer for `parameter_mappings`/`values_source_config`
/// targets, which carry the same shape outside a question payload.
/// Returns the source field ids that had no mapping.
pub fn rewrite_field_ref_tree(value: &mut Value, source_db: i64, resolver: &dyn Resolver) -> Vec<i64> {
    let mut report = RewriteReport::default();
    rewrite_field_refs(value, source_db, resolver, &mut report);
    report.unresolved_fields
}

fn rewrite_result_metadata_entry(
    field: &mut Value,
    source_db: i64,
    resolver: &dyn Resolver,
    report: &mut RewriteReport,
) {
    if let Some(field_ref) = field.get_mut("field_ref") {
        rewrite_field_refs(field_ref, source_db, resolver, report);
    }
    if let Some(id) = field.get("id").and_then(Value::as_i64) {
        match resolver.resolve_field(source_db, id) {
            Some(target) => field["id"] = Value::from(target),
            None => report.unresolved_fields.push(id),
        }
    }
    if field.get("table_id").is_some() {
        rewrite_table_ref(field, "table_id", source_db, resolver, report);
    }
}

/// Rewrite a native-query container: substitute `{{#<id>-<slug>}}`
/// occurrences in the SQL text and rewrite the `template-tags` map.
/// `sql_key` is `"query"` for the legacy `dataset_query.native` object and
/// `"native"` for a stage-based native stage (see [`crate::refs`]).
fn rewrite_native(
    container: &mut Value,
    sql_key: &str,
    resolver: &dyn Resolver,
    report: &mut RewriteReport,
) {
    if let Some(sql) = container.get(sql_key).and_then(Value::as_str) {
        let mut unresolved = Vec::new();
        let rewritten = template_tag_text_re()
            .replace_all(sql, |caps: &regex_lite::Captures| {
                let id: i64 = caps[1].parse().expect("regex guarantees digits");
                let slug = &caps[2];
                match resolver.resolve_question(id) {
                    Some(target) => format!("{{{{#{}-{}}}}}", target, slug),
                    None => {
                        unresolved.push(id);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();
        container[sql_key] = Value::String(rewritten);
        report.unresolved_cards.extend(unresolved);
    }

    let Some(tags) = container.get_mut("template-tags").and_then(Value::as_object_mut) else {
        return;
    };

    let mut renamed = Vec::new();
    for (key, tag) in tags.iter_mut() {
        if tag.get("type").and_then(Value::as_str) != Some("card") {
            continue;
        }
        let Some(card_id) = tag.get("card-id").and_then(Value::as_i64) else {
            continue;
        };
        let Some(target) = resolver.resolve_question(card_id) else {
            report.unresolved_cards.push(card_id);
            continue;
        };
        tag["card-id"] = Value::from(target);

        if let Some((has_hash, _, slug)) = parse_template_tag_key(key) {
            let prefix = if has_hash { "#" } else { "" };
            let new_key = format!("{}{}-{}", prefix, target, slug);
            tag["name"] = Value::String(new_key.clone());
            if let Some(display_name) = tag.get("display-name").and_then(Value::as_str) {
                let new_display = rewrite_display_name(display_name, target);
                tag["display-name"] = Value::String(new_display);
            }
            renamed.push((key.clone(), new_key));
        }
    }
    for (old_key, new_key) in renamed {
        if let Some(value) = tags.remove(&old_key) {
            tags.insert(new_key, value);
        }
    }
}

/// Replace the numeric portion of a `display-name` like `"#50 Filtered
/// XXX"` with the target id, preserving an optional leading `#` and the
/// rest of the text verbatim.
fn rewrite_display_name(display_name: &str, target_id: i64) -> String {
    let (prefix, rest) = match display_name.strip_prefix('#') {
        Some(rest) => ("#", rest),
        None => ("", display_name),
    };
    match rest.split_once(' ') {
        Some((_, tail)) => format!("{}{} {}", prefix, target_id, tail),
        None => format!("{}{}", prefix, target_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeResolver {
        databases: BTreeMap<i64, i64>,
        tables: BTreeMap<(i64, i64), i64>,
        fields: BTreeMap<(i64, i64), i64>,
        questions: BTreeMap<i64, i64>,
    }

    impl Resolver for FakeResolver {
        fn resolve_database(&self, source_db_id: i64) -> Option<i64> {
            self.databases.get(&source_db_id).copied()
        }
        fn resolve_table(&self, source_db_id: i64, source_table_id: i64) -> Option<i64> {
            self.tables.get(&(source_db_id, source_table_id)).copied()
        }
        fn resolve_field(&self, source_db_id: i64, source_field_id: i64) -> Option<i64> {
            self.fields.get(&(source_db_id, source_field_id)).copied()
        }
        fn resolve_question(&self, source_question_id: i64) -> Option<i64> {
            self.questions.get(&source_question_id).copied()
        }
    }

    /// S1 — single question with a field filter.
    #[test]
    fn s1_rewrites_database_table_and_field_in_filter() {
        let mut resolver = FakeResolver::default();
        resolver.databases.insert(1, 100);
        resolver.tables.insert((1, 7), 70);
        resolver.fields.insert((1, 201), 2010);

        let mut payload = json!({
            "database_id": 1,
            "table_id": 7,
            "dataset_query": {
                "type": "query",
                "database": 1,
                "query": {
                    "source-table": 7,
                    "filter": ["=", ["field", 201, null], "X"]
                }
            }
        });

        let report = rewrite_question(&mut payload, &resolver);
        assert!(report.is_fully_resolved());
        assert_eq!(payload["dataset_query"]["database"], json!(100));
        assert_eq!(payload["table_id"], json!(70));
        assert_eq!(
            payload["dataset_query"]["query"]["filter"],
            json!(["=", ["field", 2010, null], "X"])
        );
    }

    /// S2 — question depending on a model via `source-table`.
    #[test]
    fn s2_rewrites_card_ref_source_table() {
        let mut resolver = FakeResolver::default();
        resolver.databases.insert(1, 100);
        resolver.questions.insert(50, 500);

        let mut payload = json!({
            "database_id": 1,
            "dataset_query": {
                "type": "query",
                "database": 1,
                "query": { "source-table": "card__50" }
            }
        });

        let report = rewrite_question(&mut payload, &resolver);
        assert!(report.is_fully_resolved());
        assert_eq!(
            payload["dataset_query"]["query"]["source-table"],
            json!("card__500")
        );
    }

    /// S3 — native SQL with a `#`-prefixed template-tag key.
    #[test]
    fn s3_rewrites_hash_prefixed_template_tag() {
        let mut resolver = FakeResolver::default();
        resolver.databases.insert(1, 100);
        resolver.questions.insert(50, 406);

        let mut payload = json!({
            "database_id": 1,
            "dataset_query": {
                "type": "native",
                "database": 1,
                "native": {
                    "query": "select * from {{#50-filtered-xxx}}",
                    "template-tags": {
                        "#50-filtered-xxx": {
                            "type": "card",
                            "card-id": 50,
                            "name": "#50-filtered-xxx",
                            "display-name": "#50 Filtered XXX"
                        }
                    }
                }
            }
        });

        let report = rewrite_question(&mut payload, &resolver);
        assert!(report.is_fully_resolved());

        let native = &payload["dataset_query"]["native"];
        assert_eq!(native["query"], json!("select * from {{#406-filtered-xxx}}"));
        let tag = &native["template-tags"]["#406-filtered-xxx"];
        assert_eq!(tag["card-id"], json!(406));
        assert_eq!(tag["name"], json!("#406-filtered-xxx"));
        assert_eq!(tag["display-name"], json!("#406 Filtered XXX"));
    }

    #[test]
    fn no_database_reference_returns_not_ok() {
        let resolver = FakeResolver::default();
        let mut payload = json!({ "name": "orphan" });
        let report = rewrite_question(&mut payload, &resolver);
        assert!(!report.ok);
        assert_eq!(payload, json!({ "name": "orphan" }));
    }

    #[test]
    fn unresolved_field_is_left_intact_and_reported() {
        let mut resolver = FakeResolver::default();
        resolver.databases.insert(1, 100);

        let mut payload = json!({
            "database_id": 1,
            "dataset_query": {
                "type": "query",
                "database": 1,
                "query": { "filter": ["=", ["field", 999, null], 1] }
            }
        });

        let report = rewrite_question(&mut payload, &resolver);
        assert!(report.ok);
        assert!(!report.is_fully_resolved());
        assert_eq!(report.unresolved_fields, vec![999]);
        assert_eq!(
            payload["dataset_query"]["query"]["filter"],
            json!(["=", ["field", 999, null], 1])
        );
    }

    /// Invariant 3 — running the rewriter twice on an already-rewritten
    /// payload against the same resolver state should be idempotent with
    /// respect to already-target identifiers passed back through: once
    /// the source ids are gone, nothing further matches the source-keyed
    /// resolver and the payload stops changing.
    #[test]
    fn rewriting_an_already_rewritten_payload_is_a_no_op_without_matching_source_ids() {
        let mut resolver = FakeResolver::default();
        resolver.databases.insert(1, 100);
        resolver.tables.insert((1, 7), 70);

        let mut payload = json!({
            "database_id": 1,
            "dataset_query": {
                "type": "query",
                "database": 1,
                "query": { "source-table": 7 }
            }
        });

        rewrite_question(&mut payload, &resolver);
        let once = payload.clone();

        // Resolving against the *target* database id now fails, since the
        // resolver is keyed by source id — so a second pass is inert.
        let second_report = rewrite_question(&mut payload, &resolver);
        assert!(!second_report.ok);
        assert_eq!(payload, once);
    }

    #[test]
    fn rewrite_field_ref_tree_rewrites_nested_field_refs_and_reports_misses() {
        let mut resolver = FakeResolver::default();
        resolver.fields.insert((1, 201), 2010);

        let mut target = json!(["dimension", ["field", 201, null]]);
        let unresolved = rewrite_field_ref_tree(&mut target, 1, &resolver);
        assert_eq!(target, json!(["dimension", ["field", 2010, null]]));
        assert!(unresolved.is_empty());

        let mut missing = json!(["field", 999, null]);
        let unresolved = rewrite_field_ref_tree(&mut missing, 1, &resolver);
        assert_eq!(unresolved, vec![999]);
    }
}
