//! CLI error types, result alias, and the exit-code mapping (spec §6: 0
//! success; 1 client/API error; 2 bad package or missing files; 3
//! unexpected error; 4 is decided by the binary from the import report,
//! not from an error variant).

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// A command-line argument combination that clap's own validation
    /// can't express (e.g. mixed credential flags).
    #[error("invalid argument: {0}")]
    #[diagnostic(code(migrate::args))]
    Args(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(migrate::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(migrate::client))]
    Client(#[from] migrate_client::ClientError),

    #[error(transparent)]
    #[diagnostic(code(migrate::engine))]
    Engine(#[from] migrate_engine::EngineError),
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self::Args(msg.into())
    }

    /// The process exit code this error should produce.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Args(_) | CliError::Io(_) => 2,
            CliError::Client(_) => 1,
            CliError::Engine(err) => match err {
                migrate_engine::EngineError::Config(_) => 2,
                migrate_engine::EngineError::Mapping(_) => 1,
                migrate_engine::EngineError::Transport(_) => 1,
                migrate_engine::EngineError::Reference { .. } | migrate_engine::EngineError::SchemaDrift(_) | migrate_engine::EngineError::Other(_) => 3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_maps_to_bad_package_exit_code() {
        let err = CliError::Engine(migrate_engine::EngineError::config("missing manifest.json"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn args_error_maps_to_exit_code_two() {
        assert_eq!(CliError::args("bad flags").exit_code(), 2);
    }
}
