//! Error types for the regret-matching engine.
//!
//! Every failure is surfaced to the caller. The engine never retries and never
//! swallows a storage failure.

use std::path::PathBuf;

use crate::cfr::config::ConfigError;

/// Errors returned by [`RegretEngine`](crate::cfr::RegretEngine) operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A strategy was requested for a state with no registered actions.
    #[error("no actions registered for state {state:?}")]
    EmptyActionSet {
        /// The state key that was looked up.
        state: String,
    },

    /// Required configuration (such as a remote credential) is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Local or remote I/O failed during persist/restore.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A progress document is missing fields or has the wrong shape.
    #[error("malformed progress document: {0}")]
    MalformedDocument(String),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

/// Underlying I/O failure for local or remote persistence.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a local file failed.
    #[error("{}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// The OS error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request could not be completed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    #[error("remote store returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Shorthand result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
