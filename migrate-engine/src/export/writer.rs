//! Assembles the session's bookkeeping into a [`Manifest`] and writes
//! `manifest.json` last, after every entity file has been written
//! successfully (spec §5: "manifest file is written only after all
//! other outputs succeed").

use migrate_model::{Manifest, ManifestMeta};

use crate::error::{EngineError, EngineResult};
use crate::export::session::ExportSession;

pub struct ManifestWriter;

impl ManifestWriter {
    /// Redact credential-bearing flag values before they're recorded in
    /// the manifest (matches the source's `_redact_args` behavior).
    pub fn redact_cli_args(args: &[String]) -> Vec<String> {
        const SECRET_FLAGS: &[&str] = &["--password", "--session-token", "--api-key"];
        let mut redacted = Vec::with_capacity(args.len());
        let mut redact_next = false;
        for arg in args {
            if redact_next {
                redacted.push("***".to_string());
                redact_next = false;
                continue;
            }
            if let Some((flag, _value)) = arg.split_once('=') {
                if SECRET_FLAGS.contains(&flag) {
                    redacted.push(format!("{flag}=***"));
                    continue;
                }
            }
            if SECRET_FLAGS.contains(&arg.as_str()) {
                redact_next = true;
            }
            redacted.push(arg.clone());
        }
        redacted
    }

    pub fn write(session: &ExportSession, source_url: &str, tool_version: &str, cli_args: &[String]) -> EngineResult<Manifest> {
        let manifest = Manifest {
            meta: ManifestMeta {
                source_url: source_url.to_string(),
                export_timestamp: chrono::Utc::now(),
                tool_version: tool_version.to_string(),
                cli_args: Self::redact_cli_args(cli_args),
            },
            databases: session.databases.clone(),
            database_metadata: session.database_metadata.clone(),
            collections: session.collections.clone(),
            cards: session.cards.clone(),
            dashboards: session.dashboards.clone(),
            permission_groups: session.permission_groups.clone(),
            permissions_graph: session.permissions_graph.clone(),
            collection_permissions_graph: session.collection_permissions_graph.clone(),
        };

        let path = session.export_root.join("manifest.json");
        let mut bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| EngineError::other(e.to_string()))?;
        bytes.push(b'\n');
        std::fs::write(&path, &bytes).map_err(|e| EngineError::other(format!("writing {}: {e}", path.display())))?;

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_cli_args_masks_password_value() {
        let args = vec!["--source-url".to_string(), "https://x".to_string(), "--password".to_string(), "hunter2".to_string()];
        let redacted = ManifestWriter::redact_cli_args(&args);
        assert_eq!(redacted, vec!["--source-url", "https://x", "--password", "***"]);
    }

    #[test]
    fn redact_cli_args_masks_equals_form() {
        let args = vec!["--api-key=secret123".to_string()];
        let redacted = ManifestWriter::redact_cli_args(&args);
        assert_eq!(redacted, vec!["--api-key=***"]);
    }

    #[test]
    fn write_produces_manifest_json_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let session = ExportSession::new(crate::export::session::ExportConfig::default(), tmp.path().to_path_buf());
        let manifest = ManifestWriter::write(&session, "https://source.example.com", "0.1.0", &[]).unwrap();
        assert!(tmp.path().join("manifest.json").exists());
        assert_eq!(manifest.meta.tool_version, "0.1.0");
    }
}
