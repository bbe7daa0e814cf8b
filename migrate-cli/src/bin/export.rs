//! `migrate-export` binary entry point.

use clap::Parser;

use migrate_cli::cli::ExportArgs;
use migrate_cli::commands;
use migrate_cli::output;

#[tokio::main]
async fn main() {
    let args = ExportArgs::parse();
    init_tracing(&args.log_level);

    if let Err(err) = commands::export::run(args).await {
        output::newline();
        output::error(&err.to_string());
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
