//! Error types for the export and import pipelines.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the export and import pipelines, mirroring the
/// error kinds named for this tool: missing/malformed config, unresolved
/// identity mappings, dangling references, drifted target schema,
/// transport failures, and a catch-all for anything else.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing manifest, missing db map, or malformed JSON. Fatal at
    /// load, before any write.
    #[error("configuration error: {0}")]
    Config(String),

    /// A non-archived question references a database with no entry in
    /// `db_map.json`, or a mapped target database doesn't exist on the
    /// target. Fatal before any write.
    #[error("{0}")]
    Mapping(MappingFailure),

    /// A question dependency is missing at install time. Item-level;
    /// surfaced as a failed report entry, not an abort.
    #[error("unresolved reference to question {referenced} from question {from}")]
    Reference { from: i64, referenced: i64 },

    /// A table or field name present in the manifest is absent from the
    /// target database's metadata.
    #[error("schema drift: {0}")]
    SchemaDrift(String),

    #[error("transport error: {0}")]
    Transport(#[from] migrate_client::ClientError),

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn schema_drift(msg: impl Into<String>) -> Self {
        Self::SchemaDrift(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// A single consolidated `Mapping` failure: every unmapped or
/// dangling database, with the non-archived question ids that depend on
/// it, so the CLI can print one message listing every offender (spec
/// §7: "a single consolidated message").
#[derive(Debug, Clone)]
pub struct MappingFailure {
    pub unmapped_databases: Vec<UnmappedDatabase>,
}

#[derive(Debug, Clone)]
pub struct UnmappedDatabase {
    pub source_database_id: i64,
    pub source_database_name: String,
    pub affected_question_ids: Vec<i64>,
    /// `true` when the database has a `db_map.json` entry, but the
    /// mapped target id doesn't exist on the target instance.
    pub target_missing: bool,
}

impl std::fmt::Display for MappingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "unresolved database mapping(s):")?;
        for entry in &self.unmapped_databases {
            let reason = if entry.target_missing {
                "mapped target database does not exist on target"
            } else {
                "no entry in db_map.json"
            };
            writeln!(
                f,
                "  - database {} ({}): {} — affects questions {:?}",
                entry.source_database_id, entry.source_database_name, reason, entry.affected_question_ids
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_failure_display_lists_every_offender() {
        let failure = MappingFailure {
            unmapped_databases: vec![UnmappedDatabase {
                source_database_id: 7,
                source_database_name: "Sales DB".into(),
                affected_question_ids: vec![10, 11],
                target_missing: false,
            }],
        };
        let msg = EngineError::Mapping(failure).to_string();
        assert!(msg.contains("Sales DB"));
        assert!(msg.contains("10"));
        assert!(msg.contains("11"));
    }

    #[test]
    fn config_error_constructor() {
        let err = EngineError::config("missing manifest.json");
        assert!(err.to_string().contains("missing manifest.json"));
    }
}
