//! Loads a package from disk: the manifest, the user-authored db map,
//! and individual entity files — re-checksumming each against the
//! manifest (spec invariant: "checksum round-trip").

use std::path::{Path, PathBuf};

use migrate_model::{checksum, DatabaseMap, Manifest};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

pub struct PackageLoader;

impl PackageLoader {
    pub fn load_manifest(export_root: &Path) -> EngineResult<Manifest> {
        let path = export_root.join("manifest.json");
        let bytes = std::fs::read(&path).map_err(|e| EngineError::config(format!("reading {}: {e}", path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::config(format!("parsing {}: {e}", path.display())))
    }

    pub fn load_db_map(path: &Path) -> EngineResult<DatabaseMap> {
        let bytes = std::fs::read(path).map_err(|e| EngineError::config(format!("reading {}: {e}", path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::config(format!("parsing {}: {e}", path.display())))
    }

    /// Read an entity file relative to `export_root`, verifying its
    /// checksum against the manifest's recorded value.
    pub fn load_entity(export_root: &Path, relative_path: &str, expected_checksum: &str) -> EngineResult<Value> {
        let full_path: PathBuf = export_root.join(relative_path);
        let bytes = std::fs::read(&full_path).map_err(|e| EngineError::config(format!("reading {}: {e}", full_path.display())))?;
        let actual = checksum::checksum_bytes(&bytes);
        if actual != expected_checksum {
            return Err(EngineError::config(format!(
                "checksum mismatch for {}: manifest says {expected_checksum}, file hashes to {actual}",
                full_path.display()
            )));
        }
        serde_json::from_slice(&bytes).map_err(|e| EngineError::config(format!("parsing {}: {e}", full_path.display())))
    }
}
