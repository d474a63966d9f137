//! Error taxonomy for monitoring passes.
//!
//! - [`ConfigError`]: fatal, raised before the first pass
//! - [`FetchError`]: per-dimension outcome of a remote call
//! - [`MonitorError`]: a whole pass could not complete

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use watch_state::StoreError;

/// Result of a single adapter call.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Why an adapter call did not produce a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The API signalled quota exhaustion. `retry_at` is the advertised reset
    /// time, when the API sent one.
    #[error("rate limited (retry at {retry_at:?})")]
    Throttled { retry_at: Option<DateTime<Utc>> },

    /// Timeout, connection failure or server-side error; may succeed later.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// The request cannot succeed as issued (bad credentials, not found,
    /// undecodable response).
    #[error("fetch failed: {0}")]
    Fatal(String),
}

impl FetchError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, FetchError::Throttled { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Throttled { .. } | FetchError::Transient(_)
        )
    }
}

/// Configuration problems. These abort before any pass runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("invalid resource identity: {0}")]
    InvalidIdentity(String),

    #[error("no resources to monitor")]
    NothingToMonitor,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("failed to read URL list {path:?}: {source}")]
    UrlList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A monitoring pass failed as a whole.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("baseline store error: {0}")]
    Store(#[from] StoreError),

    #[error("pass panicked: {0}")]
    Panicked(String),
}

impl MonitorError {
    pub fn is_config(&self) -> bool {
        matches!(self, MonitorError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_counts_as_transient() {
        let err = FetchError::Throttled { retry_at: None };
        assert!(err.is_throttled());
        assert!(err.is_transient());
        assert!(!FetchError::Fatal("404".to_string()).is_transient());
    }

    #[test]
    fn config_error_display_names_the_variable() {
        let err = ConfigError::MissingCredential("GITHUB_TOKEN");
        assert!(err.to_string().contains("GITHUB_TOKEN"));
        assert!(MonitorError::from(err).is_config());
    }
}
