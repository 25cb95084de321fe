//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or writing stored records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The learner id cannot be used as a file name.
    #[error("invalid learner id {0:?}: use letters, digits, '-', '_' or '.'")]
    InvalidLearnerId(String),

    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be (de)serialized.
    #[error("malformed record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A blocking file task panicked or was cancelled.
    #[error("file task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
