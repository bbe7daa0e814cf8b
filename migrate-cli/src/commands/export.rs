//! The `migrate-export` command: authenticate against the source
//! instance, run the export pipeline, and print a summary.

use migrate_client::Client;
use migrate_engine::{run_export, ExportConfig};

use crate::cli::ExportArgs;
use crate::error::{CliError, CliResult};
use crate::output;

pub async fn run(args: ExportArgs) -> CliResult<()> {
    let credentials = args.credentials.into_credentials().map_err(CliError::args)?;

    output::header("Export");
    output::kv("Source", &args.source_url);
    output::kv("Export directory", &args.export_dir.display().to_string());

    let client = migrate_client::ReqwestClient::from_url(&args.source_url)?;
    let session = client.establish_session(credentials).await?;
    let client = client.with_session(session);

    std::fs::create_dir_all(&args.export_dir)?;

    let config = ExportConfig {
        include_archived: args.include_archived,
        include_dashboards: args.include_dashboards,
        include_permissions: args.include_permissions,
        root_collection_ids: args.root_collection_ids.clone(),
        include_personal_owner_ids: args.include_personal_owner_ids.clone(),
    };

    let cli_args: Vec<String> = std::env::args().collect();
    let manifest = run_export(&client, config, args.export_dir.clone(), &args.source_url, env!("CARGO_PKG_VERSION"), &cli_args).await?;

    output::newline();
    output::success("Export complete");
    output::kv("Collections", &manifest.collections.len().to_string());
    output::kv("Questions", &manifest.cards.len().to_string());
    output::kv("Dashboards", &manifest.dashboards.len().to_string());
    output::kv("Databases", &manifest.databases.len().to_string());

    Ok(())
}
