//! Detection of the two MBQL dialect generations a question payload may use.
//!
//! Version is detected once per payload by presence of the legacy
//! `query` key versus the newer `stages` key under `dataset_query`
//! (spec §9: "selection happens once per payload").

use serde_json::Value;

/// Which query-language generation a `dataset_query` tree is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `dataset_query.query.{...}`, with joins and clauses nested directly.
    Legacy,
    /// `dataset_query.stages[*]`, each stage tagged `mbql` or `native`.
    StageBased,
}

impl Dialect {
    /// Inspect a `dataset_query` value and determine its dialect.
    ///
    /// Defaults to [`Dialect::Legacy`] when neither `query` nor `stages` is
    /// present — an empty or native-only query still needs a dialect to
    /// drive which shape the rewriter looks for, and the legacy shape is
    /// the more permissive of the two to walk over an unexpected tree.
    pub fn detect(dataset_query: &Value) -> Self {
        if dataset_query.get("stages").and_then(Value::as_array).is_some() {
            Dialect::StageBased
        } else {
            Dialect::Legacy
        }
    }
}
