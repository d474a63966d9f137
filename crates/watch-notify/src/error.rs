//! Error types for watch-notify

use thiserror::Error;

/// Errors that can occur while delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a status the channel does not treat as success
    #[error("{channel} rejected notification with status {status}")]
    Rejected { channel: String, status: u16 },

    /// SMTP delivery or message construction error
    #[error("email error: {0}")]
    Email(String),

    /// Invalid channel configuration
    #[error("invalid notification config: {0}")]
    Config(String),

    /// Unknown channel name
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// Unknown severity label
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        NotifyError::Email(err.to_string())
    }
}

impl From<lettre::error::Error> for NotifyError {
    fn from(err: lettre::error::Error) -> Self {
        NotifyError::Email(err.to_string())
    }
}

impl From<lettre::address::AddressError> for NotifyError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotifyError::Email(format!("invalid address: {err}"))
    }
}
