//! `migrate-import` binary entry point.

use clap::Parser;

use migrate_cli::cli::ImportArgs;
use migrate_cli::commands;
use migrate_cli::output;

#[tokio::main]
async fn main() {
    let args = ImportArgs::parse();
    init_tracing(&args.log_level);

    match commands::import::run(args).await {
        Ok(report) => {
            if report.has_failures() {
                std::process::exit(4);
            }
        }
        Err(err) => {
            output::newline();
            output::error(&err.to_string());
            std::process::exit(err.exit_code());
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
