//! Command-line export and import tools for migrating analytics-platform
//! content (collections, questions, dashboards, permissions) between
//! instances.
//!
//! Two binaries share this library: `migrate-export` walks a source
//! instance into an on-disk package; `migrate-import` installs that
//! package against a target instance. Each owns its own `clap` argument
//! struct in [`cli`]; both funnel through [`migrate_engine::run_export`]
//! / [`migrate_engine::run_import`].

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
