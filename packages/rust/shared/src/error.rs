//! Error types for qabase.
//!
//! Library crates use [`QaBaseError`] via `thiserror`.
//! The HTTP layer maps it onto status codes; the CLI wraps it with
//! `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::Status;

/// Top-level error type for all qabase operations.
#[derive(Debug, thiserror::Error)]
pub enum QaBaseError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed input: missing or blank required fields, bad CSV header.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// No entry with the given id.
    #[error("entry {id} not found")]
    NotFound { id: String },

    /// The operation is not allowed from the entry's current status.
    #[error("cannot {operation} entry in status '{from}': {reason}")]
    InvalidTransition {
        from: Status,
        operation: &'static str,
        reason: String,
    },

    /// An argument value outside its domain, such as an unknown status.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An intake adapter could not reach or use an external service.
    #[error("ingest error: {0}")]
    Ingest(String),

    /// Transcription failed or produced no usable question/answer pair.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// The HTTP listener could not be bound or failed while serving.
    #[error("server error: {0}")]
    Server(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QaBaseError>;

impl QaBaseError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invalid-argument error from any displayable message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    /// Create a not-found error for an entry id.
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create an invalid-transition error.
    pub fn invalid_transition(
        from: Status,
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            from,
            operation,
            reason: reason.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
