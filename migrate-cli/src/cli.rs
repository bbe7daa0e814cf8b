//! CLI argument definitions for the `migrate-export` and `migrate-import`
//! binaries, using clap.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use migrate_client::Credentials;
use migrate_engine::ConflictStrategy;

/// Export analytics-platform content into a migration package.
#[derive(Parser, Debug)]
#[command(name = "migrate-export")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Export analytics-platform content into a migration package", long_about = None)]
pub struct ExportArgs {
    /// Base URL of the source analytics platform instance
    #[arg(long, env = "MIGRATE_SOURCE_URL")]
    pub source_url: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Directory to write the export package into
    #[arg(long)]
    pub export_dir: PathBuf,

    /// Include archived questions and dashboards
    #[arg(long)]
    pub include_archived: bool,

    /// Also export dashboards, and every question they reference
    #[arg(long)]
    pub include_dashboards: bool,

    /// Also snapshot the data and collection permissions graphs
    #[arg(long)]
    pub include_permissions: bool,

    /// Limit the export to these collection ids and their descendants
    /// (comma-separated); defaults to the whole instance
    #[arg(long, value_delimiter = ',')]
    pub root_collection_ids: Option<Vec<i64>>,

    /// Personal collections owned by these user ids are included despite
    /// the default skip (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "")]
    pub include_personal_owner_ids: Vec<i64>,

    /// Log verbosity passed to the tracing env filter (e.g. info, debug)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Install a migration package into a target analytics platform instance.
#[derive(Parser, Debug)]
#[command(name = "migrate-import")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Install a migration package into a target analytics platform instance", long_about = None)]
pub struct ImportArgs {
    /// Base URL of the target analytics platform instance
    #[arg(long, env = "MIGRATE_TARGET_URL")]
    pub target_url: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Directory the export package was written to
    #[arg(long)]
    pub export_dir: PathBuf,

    /// Path to the `db_map.json` mapping source database ids to target ones
    #[arg(long)]
    pub db_map: PathBuf,

    /// What to do when an entity with the same name already exists on the target
    #[arg(long, value_enum, default_value = "skip")]
    pub conflict_strategy: ConflictStrategyArg,

    /// Also install dashboards from the package
    #[arg(long)]
    pub include_dashboards: bool,

    /// Apply the exported permissions graphs to the target
    #[arg(long)]
    pub apply_permissions: bool,

    /// Run the full pipeline without issuing any create/update calls
    /// against the target instance
    #[arg(long)]
    pub dry_run: bool,

    /// Log verbosity passed to the tracing env filter (e.g. info, debug)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Session establishment flags shared by both binaries (spec §6:
/// "user+password **or** session token **or** personal token — one of
/// three").
#[derive(Args, Debug, Default)]
pub struct CredentialArgs {
    /// Account email, used together with --password
    #[arg(long, env = "MIGRATE_EMAIL")]
    pub email: Option<String>,

    /// Account password, used together with --email
    #[arg(long, env = "MIGRATE_PASSWORD")]
    pub password: Option<String>,

    /// An existing session token
    #[arg(long, env = "MIGRATE_SESSION_TOKEN")]
    pub session_token: Option<String>,

    /// A personal API key
    #[arg(long, env = "MIGRATE_API_KEY")]
    pub api_key: Option<String>,
}

impl CredentialArgs {
    /// Resolve exactly one of the three supported credential shapes, or
    /// describe why the combination given is ambiguous or incomplete.
    pub fn into_credentials(self) -> Result<Credentials, String> {
        match (self.email, self.password, self.session_token, self.api_key) {
            (Some(email), Some(password), None, None) => Ok(Credentials::UserPassword { email, password }),
            (None, None, Some(token), None) => Ok(Credentials::SessionToken(token)),
            (None, None, None, Some(key)) => Ok(Credentials::ApiKey(key)),
            _ => Err("specify exactly one of: --email with --password, --session-token, or --api-key".to_string()),
        }
    }
}

/// CLI-facing mirror of [`ConflictStrategy`], so clap can derive a
/// `ValueEnum` without requiring the engine crate to depend on clap.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum ConflictStrategyArg {
    #[default]
    Skip,
    Overwrite,
    Rename,
}

impl From<ConflictStrategyArg> for ConflictStrategy {
    fn from(value: ConflictStrategyArg) -> Self {
        match value {
            ConflictStrategyArg::Skip => ConflictStrategy::Skip,
            ConflictStrategyArg::Overwrite => ConflictStrategy::Overwrite,
            ConflictStrategyArg::Rename => ConflictStrategy::Rename,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_and_password_pair_resolve_to_user_password() {
        let args = CredentialArgs { email: Some("a@b.com".into()), password: Some("hunter2".into()), ..Default::default() };
        let credentials = args.into_credentials().unwrap();
        assert!(matches!(credentials, Credentials::UserPassword { email, .. } if email == "a@b.com"));
    }

    #[test]
    fn session_token_alone_resolves() {
        let args = CredentialArgs { session_token: Some("tok".into()), ..Default::default() };
        assert!(matches!(args.into_credentials().unwrap(), Credentials::SessionToken(t) if t == "tok"));
    }

    #[test]
    fn api_key_alone_resolves() {
        let args = CredentialArgs { api_key: Some("key".into()), ..Default::default() };
        assert!(matches!(args.into_credentials().unwrap(), Credentials::ApiKey(k) if k == "key"));
    }

    #[test]
    fn email_without_password_is_rejected() {
        let args = CredentialArgs { email: Some("a@b.com".into()), ..Default::default() };
        assert!(args.into_credentials().is_err());
    }

    #[test]
    fn mixing_two_credential_kinds_is_rejected() {
        let args = CredentialArgs { session_token: Some("tok".into()), api_key: Some("key".into()), ..Default::default() };
        assert!(args.into_credentials().is_err());
    }

    #[test]
    fn no_credentials_is_rejected() {
        assert!(CredentialArgs::default().into_credentials().is_err());
    }
}
