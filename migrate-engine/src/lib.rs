//! # migrate-engine
//!
//! The ID-remapping and dependency-resolution engine at the heart of the
//! migration tool: the export graph-walker, the on-disk package format,
//! and the topologically ordered re-installer.
//!
//! ## Architecture
//!
//! Two pipelines share a common data model ([`migrate_model`]) and a
//! common rewriter ([`migrate_query`]):
//!
//! ```text
//! ┌───────────────────┐        ┌────────────────────┐
//! │   export::run_export│  →   manifest.json + files │
//! └───────────────────┘        └────────────────────┘
//!                                        │
//!                                        ▼
//! ┌────────────────────┐       ┌────────────────────┐
//! │ import::run_import  │  ←   │   db_map.json       │
//! └────────────────────┘       └────────────────────┘
//! ```
//!
//! [`export::run_export`] walks the source collection forest, discovers
//! every question a dashboard or question transitively depends on, and
//! writes a checksummed package. [`import::run_import`] loads that
//! package against a target instance, validates that every referenced
//! database has a mapping, then installs collections, questions,
//! dashboards, and optionally permissions in dependency order.
//!
//! The [`conflict`] module implements the single conflict strategy
//! (`skip`/`overwrite`/`rename`) shared by every installer.

pub mod conflict;
pub mod error;
pub mod export;
pub mod import;

#[cfg(test)]
mod testutil;

pub use conflict::{ConflictStrategy, NameIndex, Resolution};
pub use error::{EngineError, EngineResult, MappingFailure, UnmappedDatabase};
pub use export::{run_export, ExportConfig};
pub use import::{run_import, ImportConfig};
