//! Errors raised while classifying a query dialect or walking a payload.
//!
//! The rewriter itself is infallible at the structural level — unresolved
//! identifiers are reported back through [`crate::rewriter::RewriteReport`]
//! rather than as an `Err`. This error type only covers malformed input that
//! the walker cannot make sense of at all.

use thiserror::Error;

/// Result type for `migrate-query` operations.
pub type RewriteResult<T> = Result<T, RewriteError>;

/// Errors from dialect detection and query-tree traversal.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("payload has neither `query` nor `stages` under `dataset_query`: {context}")]
    UnknownDialect { context: String },

    #[error("expected `{expected}` at `{path}`, found `{found}`")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
        found: String,
    },

    #[error("malformed card reference `{raw}`: {reason}")]
    MalformedCardRef { raw: String, reason: String },
}

impl RewriteError {
    pub fn unknown_dialect(context: impl Into<String>) -> Self {
        Self::UnknownDialect {
            context: context.into(),
        }
    }

    pub fn unexpected_shape(
        path: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedShape {
            path: path.into(),
            expected,
            found: found.into(),
        }
    }

    pub fn malformed_card_ref(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCardRef {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}
