//! # migrate-query
//!
//! The query-tree rewriter shared by the export and import pipelines.
//!
//! A question's `dataset_query` embeds instance-local integer identifiers
//! (database, table, field) and references to other saved questions, in
//! one of two query-language dialect generations. This crate owns:
//!
//! - [`dialect`] — detecting which dialect a `dataset_query` uses.
//! - [`refs`] — the reference-shape catalog: the same shape recognition
//!   used both to discover a question's dependencies at export time and
//!   to rewrite them at import time.
//! - [`rewriter`] — the structural walk that substitutes target
//!   identifiers throughout a question payload.
//!
//! It does not fetch payloads, walk the collection forest, or decide
//! install order — those belong to `migrate-engine`.

pub mod dialect;
pub mod error;
pub mod refs;
pub mod rewriter;

pub use dialect::Dialect;
pub use error::{RewriteError, RewriteResult};
pub use refs::{RefShape, ReferenceCatalog, StandardCatalog};
pub use rewriter::{rewrite_field_ref_tree, rewrite_question, Resolver, RewriteReport};
