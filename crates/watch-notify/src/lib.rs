//! Watch-Notify: notification boundary for ASM Watch
//!
//! The monitoring core hands over four fields (title, message, severity and
//! a details map); everything about channel payloads and transport lives
//! here.
//!
//! ## Key Components
//!
//! - `Severity`: closed severity scale with one colour table per channel
//! - `payload`: Slack / Teams / Discord / generic JSON / email text builders
//! - `WebhookNotifier`: posts a payload to one configured webhook
//! - `EmailNotifier`: plain-text mail through an SMTP relay (STARTTLS)
//! - `NotificationHub`: fan-out to every configured channel

pub mod config;
pub mod email;
mod error;
pub mod notifier;
pub mod payload;
pub mod severity;

pub use config::{ChannelSelection, NotifyConfig, SmtpConfig};
pub use email::EmailNotifier;
pub use error::NotifyError;
pub use notifier::{Channel, Dispatcher, Notification, NotificationHub, Notifier, WebhookNotifier};
pub use severity::Severity;

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotifyError>;
