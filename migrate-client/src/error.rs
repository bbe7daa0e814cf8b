//! Error types for the analytics-platform administration API client.

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur when talking to the analytics platform.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// `true` when the response body looks like the server's known
    /// table-id foreign-key-violation message — the installer pattern
    /// matches on this to classify a `SchemaDriftError` (spec §7).
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            ClientError::Server { body, .. } => {
                let lower = body.to_lowercase();
                lower.contains("foreign key") && lower.contains("table")
            }
            _ => false,
        }
    }
}
