//! The `migrate-import` command: authenticate against the target
//! instance, run the import pipeline (optionally as a dry run), and
//! print a summary. The binary decides the process exit code from the
//! returned [`Report`] (spec §6: exit 4 on partial failure).

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use migrate_client::{Client, ClientResult, Credentials, ReqwestClient, Session};
use migrate_client::{CollectionId, CollectionItem, CollectionNode, ItemsQuery};
use migrate_engine::{run_import, ImportConfig};
use migrate_model::{KindCounts, Report};
use serde_json::Value;

use crate::cli::ImportArgs;
use crate::error::{CliError, CliResult};
use crate::output;

pub async fn run(args: ImportArgs) -> CliResult<Report> {
    let credentials = args.credentials.into_credentials().map_err(CliError::args)?;

    output::header("Import");
    output::kv("Target", &args.target_url);
    output::kv("Export directory", &args.export_dir.display().to_string());
    if args.dry_run {
        output::info("Dry run: no changes will be made to the target instance");
    }

    let client = ReqwestClient::from_url(&args.target_url)?;
    let session = client.establish_session(credentials).await?;
    let client = client.with_session(session);

    let config = ImportConfig {
        export_root: args.export_dir.clone(),
        db_map_path: args.db_map.clone(),
        conflict_strategy: args.conflict_strategy.into(),
        include_dashboards: args.include_dashboards,
        apply_permissions: args.apply_permissions,
    };

    let now = chrono::Utc::now();
    let report = if args.dry_run {
        let dry_run_client = DryRunClient::new(&client);
        run_import(&dry_run_client, &config, &args.export_dir, now).await?
    } else {
        run_import(&client, &config, &args.export_dir, now).await?
    };

    output::newline();
    output::section("Results");
    print_counts("Collections", &report.collections);
    print_counts("Questions", &report.questions);
    print_counts("Dashboards", &report.dashboards);
    print_counts("Permissions", &report.permissions);

    if report.has_failures() {
        output::newline();
        output::warn("Import completed with failures:");
        for item in report.items.iter().filter(|i| i.status == migrate_model::ReportStatus::Failed) {
            output::list_item(&format!("{} {} ({}): {}", item.kind, item.source_id, item.name, item.reason.as_deref().unwrap_or("unknown reason")));
        }
    } else {
        output::success("Import complete");
    }

    Ok(report)
}

fn print_counts(label: &str, counts: &KindCounts) {
    output::kv(label, &format!("{} created, {} updated, {} skipped, {} failed", counts.created, counts.updated, counts.skipped, counts.failed));
}

/// Wraps a real client so every mutating call is logged and answered
/// with a fresh negative placeholder id instead of reaching the target
/// instance.
struct DryRunClient<'a> {
    inner: &'a dyn Client,
    next_id: AtomicI64,
}

impl<'a> DryRunClient<'a> {
    fn new(inner: &'a dyn Client) -> Self {
        Self { inner, next_id: AtomicI64::new(-1) }
    }

    fn placeholder_id(&self) -> i64 {
        self.next_id.fetch_sub(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Client for DryRunClient<'_> {
    async fn establish_session(&self, credentials: Credentials) -> ClientResult<Session> {
        self.inner.establish_session(credentials).await
    }

    async fn get_collections_tree(&self, archived: bool) -> ClientResult<Vec<CollectionNode>> {
        self.inner.get_collections_tree(archived).await
    }

    async fn get_collection_items(&self, collection_id: CollectionId, query: &ItemsQuery) -> ClientResult<Vec<CollectionItem>> {
        self.inner.get_collection_items(collection_id, query).await
    }

    async fn get_card(&self, id: i64) -> ClientResult<Value> {
        self.inner.get_card(id).await
    }

    async fn get_dashboard(&self, id: i64) -> ClientResult<Value> {
        self.inner.get_dashboard(id).await
    }

    async fn get_databases(&self) -> ClientResult<Value> {
        self.inner.get_databases().await
    }

    async fn get_database_metadata(&self, id: i64) -> ClientResult<Value> {
        self.inner.get_database_metadata(id).await
    }

    async fn create_card(&self, payload: &Value) -> ClientResult<i64> {
        tracing::info!(name = payload.get("name").and_then(Value::as_str).unwrap_or(""), "dry-run: would create question");
        Ok(self.placeholder_id())
    }

    async fn update_card(&self, id: i64, _payload: &Value) -> ClientResult<()> {
        tracing::info!(id, "dry-run: would update question");
        Ok(())
    }

    async fn create_dashboard(&self, payload: &Value) -> ClientResult<i64> {
        tracing::info!(name = payload.get("name").and_then(Value::as_str).unwrap_or(""), "dry-run: would create dashboard");
        Ok(self.placeholder_id())
    }

    async fn update_dashboard(&self, id: i64, _payload: &Value) -> ClientResult<()> {
        tracing::info!(id, "dry-run: would update dashboard");
        Ok(())
    }

    async fn create_collection(&self, payload: &Value) -> ClientResult<i64> {
        tracing::info!(name = payload.get("name").and_then(Value::as_str).unwrap_or(""), "dry-run: would create collection");
        Ok(self.placeholder_id())
    }

    async fn update_collection(&self, id: i64, _payload: &Value) -> ClientResult<()> {
        tracing::info!(id, "dry-run: would update collection");
        Ok(())
    }

    async fn get_permissions_graph(&self) -> ClientResult<Value> {
        self.inner.get_permissions_graph().await
    }

    async fn put_permissions_graph(&self, _graph: &Value) -> ClientResult<()> {
        tracing::info!("dry-run: would update data-permissions graph");
        Ok(())
    }

    async fn get_collection_permissions_graph(&self) -> ClientResult<Value> {
        self.inner.get_collection_permissions_graph().await
    }

    async fn put_collection_permissions_graph(&self, _graph: &Value) -> ClientResult<()> {
        tracing::info!("dry-run: would update collection-permissions graph");
        Ok(())
    }
}
