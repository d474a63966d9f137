//! Error types for watch-state

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the baseline persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the state file failed
    #[error("state file I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state document could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The state document on disk is not valid JSON of the expected shape
    #[error("Corrupt state file {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
