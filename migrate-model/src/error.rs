//! Error types for entity, manifest, and package I/O.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building, (de)serializing, or validating
/// the entity model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Error reading or writing a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON in a manifest or entity file.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest field used a key that could not be parsed back to an
    /// integer (the wire format forces string keys; the loader's job is
    /// to convert them).
    #[error("non-integer key `{key}` in manifest map `{field}`")]
    NonIntegerKey { field: String, key: String },

    /// An entity file's checksum does not match the manifest's recorded
    /// checksum.
    #[error("checksum mismatch for {path}: manifest says {expected}, file hashes to {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A required field was missing or malformed in a way serde alone
    /// can't express.
    #[error("malformed {kind}: {message}")]
    Malformed { kind: String, message: String },
}

impl ModelError {
    /// Build an [`ModelError::Io`] from a path and source error.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`ModelError::Json`] from a path and source error.
    pub fn json(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Build a [`ModelError::Malformed`] error.
    pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
