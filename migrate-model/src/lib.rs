//! # migrate-model
//!
//! Entity types and the on-disk package format shared by the export and
//! import pipelines of the analytics-content migration toolkit.
//!
//! This crate owns:
//! - the entity structs (`Database`, `Collection`, `Question`,
//!   `Dashboard`, `PermissionGroup`)
//! - the `manifest.json` / `db_map.json` wire formats, including the
//!   integer-key/string-key conversion JSON forces on maps
//! - the import `Report` and its per-kind counters
//! - content checksums and filename sanitization
//!
//! It does not know how to talk to the analytics platform (`migrate-client`),
//! how to rewrite query trees (`migrate-query`), or how the export/import
//! pipelines are sequenced (`migrate-engine`).

pub mod checksum;
pub mod entities;
pub mod error;
pub mod manifest;
pub mod report;
pub mod sanitize;

pub use entities::{
    Collection, Dashboard, Database, DatabaseMetadata, FieldInfo, PermissionGroup, Question,
    TableInfo,
};
pub use error::{ModelError, ModelResult};
pub use manifest::{DatabaseMap, Manifest, ManifestMeta};
pub use report::{EntityKind, KindCounts, Report, ReportItem, ReportStatus};
