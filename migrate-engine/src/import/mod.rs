//! The import pipeline (spec §2): load the package, validate it against
//! the target, then install collections, questions, dashboards, and
//! optionally permissions, in that order (spec §5's ordering
//! guarantees). The final report is written even when the run aborts.

mod collections;
mod dashboards;
mod loader;
mod permissions;
mod questions;
mod report_writer;
mod resolver;
mod validator;

pub use collections::CollectionInstaller;
pub use dashboards::DashboardInstaller;
pub use loader::PackageLoader;
pub use permissions::PermissionsInstaller;
pub use questions::QuestionInstaller;
pub use report_writer::ReportWriter;
pub use resolver::IdentityResolver;
pub use validator::Validator;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use migrate_client::Client;
use migrate_model::Report;

use crate::conflict::ConflictStrategy;
use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub export_root: PathBuf,
    pub db_map_path: PathBuf,
    pub conflict_strategy: ConflictStrategy,
    pub include_dashboards: bool,
    pub apply_permissions: bool,
}

/// Run the whole import pipeline. The report is written to
/// `report_dir` regardless of whether the run succeeds, partially
/// fails, or aborts during validation or package loading.
pub async fn run_import(client: &dyn Client, config: &ImportConfig, report_dir: &Path, now: DateTime<Utc>) -> EngineResult<Report> {
    let mut report = Report::new();
    let outcome = run_inner(client, config, &mut report).await;

    if let Err(write_err) = ReportWriter::write(report_dir, &report, now) {
        tracing::error!(%write_err, "failed to write import report");
    }

    outcome.map(|()| report)
}

async fn run_inner(client: &dyn Client, config: &ImportConfig, report: &mut Report) -> EngineResult<()> {
    let manifest = PackageLoader::load_manifest(&config.export_root)?;
    let db_map = PackageLoader::load_db_map(&config.db_map_path)?;
    let mut resolver = IdentityResolver::new(db_map, manifest.databases.clone());

    Validator::build_table_and_field_maps(client, &manifest, &mut resolver).await?;
    Validator::validate(client, &manifest, &resolver).await?;

    CollectionInstaller::install_all(client, &manifest.collections, config.conflict_strategy, &mut resolver, report).await?;

    QuestionInstaller::install_all(client, &config.export_root, &manifest.cards, config.conflict_strategy, &mut resolver, report).await?;

    if config.include_dashboards && !manifest.dashboards.is_empty() {
        DashboardInstaller::install_all(
            client,
            &config.export_root,
            &manifest.dashboards,
            &manifest.cards,
            config.conflict_strategy,
            &mut resolver,
            report,
        )
        .await?;
    }

    if config.apply_permissions {
        PermissionsInstaller::install(client, &manifest.permissions_graph, &manifest.collection_permissions_graph, &resolver, report).await?;
    }

    Ok(())
}
