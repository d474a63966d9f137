//! Notifiers and the fan-out hub.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::NotifyConfig;
use crate::email::EmailNotifier;
use crate::error::NotifyError;
use crate::payload;
use crate::severity::Severity;
use crate::Result;

/// What the monitoring core asks to be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub details: BTreeMap<String, Value>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Supported webhook flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Slack,
    Teams,
    Discord,
    Webhook,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Slack => "slack",
            Channel::Teams => "teams",
            Channel::Discord => "discord",
            Channel::Webhook => "webhook",
        }
    }

    /// Build this channel's request body.
    pub fn payload(&self, n: &Notification, now: DateTime<Utc>) -> Value {
        match self {
            Channel::Slack => payload::slack(n, now),
            Channel::Teams => payload::teams(n, now),
            Channel::Discord => payload::discord(n, now),
            Channel::Webhook => payload::generic(n, now),
        }
    }

    /// Whether `status` means the channel accepted the message.
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            Channel::Slack | Channel::Teams => status == 200,
            Channel::Discord => status == 204,
            Channel::Webhook => matches!(status, 200 | 201 | 204),
        }
    }
}

/// A single delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used as the key in delivery results.
    fn name(&self) -> &str;

    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Consumer side of the notification boundary: deliver to every configured
/// channel and report per-channel success.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> BTreeMap<String, bool>;
}

/// Posts JSON payloads to a webhook URL.
pub struct WebhookNotifier {
    channel: Channel,
    url: String,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(channel: Channel, url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("asm-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(WebhookNotifier {
            channel,
            url: url.to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        self.channel.name()
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let body = self.channel.payload(notification, Utc::now());
        let response = self.http_client.post(&self.url).json(&body).send().await?;
        let status = response.status().as_u16();

        if self.channel.accepts(status) {
            debug!(channel = self.channel.name(), status, "notification delivered");
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                channel: self.channel.name().to_string(),
                status,
            })
        }
    }
}

/// Fan-out over every configured notifier.
#[derive(Default)]
pub struct NotificationHub {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// One webhook notifier per channel URL present in `config`, plus email
    /// when SMTP credentials and a recipient are both set.
    pub fn from_config(config: &NotifyConfig) -> Result<Self> {
        let mut hub = Self::new();
        let channels = [
            (Channel::Slack, &config.slack_webhook),
            (Channel::Teams, &config.teams_webhook),
            (Channel::Discord, &config.discord_webhook),
            (Channel::Webhook, &config.webhook_url),
        ];
        for (channel, url) in channels {
            if let Some(url) = url {
                hub.notifiers
                    .push(Box::new(WebhookNotifier::new(channel, url, config.timeout)?));
            }
        }
        if let (Some(smtp), Some(to)) = (&config.smtp, &config.email_to) {
            hub.notifiers
                .push(Box::new(EmailNotifier::new(smtp, to, config.timeout)?));
        }
        Ok(hub)
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Send to all channels. A failing channel is logged and reported as
    /// `false`; it never stops delivery to the others.
    pub async fn send_all(&self, notification: &Notification) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for notifier in &self.notifiers {
            let ok = match notifier.send(notification).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(channel = notifier.name(), error = %e, "notification failed");
                    false
                }
            };
            results.insert(notifier.name().to_string(), ok);
        }
        info!(title = %notification.title, results = ?results, "notification results");
        results
    }
}

#[async_trait]
impl Dispatcher for NotificationHub {
    async fn dispatch(&self, notification: &Notification) -> BTreeMap<String, bool> {
        self.send_all(notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelSelection, SmtpConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingNotifier {
        name: &'static str,
        fail: bool,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, _notification: &Notification) -> Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotifyError::Rejected {
                    channel: self.name.to_string(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn channel_success_codes() {
        assert!(Channel::Slack.accepts(200));
        assert!(!Channel::Slack.accepts(204));
        assert!(Channel::Discord.accepts(204));
        assert!(!Channel::Discord.accepts(200));
        assert!(Channel::Webhook.accepts(201));
        assert!(!Channel::Webhook.accepts(500));
    }

    #[test]
    fn hub_from_config_builds_one_notifier_per_url() {
        let config = NotifyConfig::default()
            .with_slack("https://hooks.slack.test/a")
            .with_webhook("https://example.test/hook");
        let hub = NotificationHub::from_config(&config).unwrap();
        assert_eq!(hub.len(), 2);

        let empty = NotificationHub::from_config(&NotifyConfig::default()).unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn hub_adds_email_only_with_a_recipient() {
        let smtp = SmtpConfig::new("alerts@example.test", "secret");
        let without_recipient = NotifyConfig::default().with_smtp(smtp.clone());
        assert!(NotificationHub::from_config(&without_recipient).unwrap().is_empty());

        let config = without_recipient
            .with_email_to("soc@example.test")
            .with_slack("https://hooks.slack.test/a");
        assert_eq!(NotificationHub::from_config(&config).unwrap().len(), 2);

        let email_only = config.select(ChannelSelection::Email);
        assert_eq!(NotificationHub::from_config(&email_only).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_others() {
        let sent = Arc::new(AtomicUsize::new(0));
        let hub = NotificationHub::new()
            .with_notifier(Box::new(CountingNotifier {
                name: "slack",
                fail: true,
                sent: sent.clone(),
            }))
            .with_notifier(Box::new(CountingNotifier {
                name: "discord",
                fail: false,
                sent: sent.clone(),
            }));

        let n = Notification::new("t", "m", Severity::High).with_detail("k", "v");
        let results = hub.dispatch(&n).await;

        assert_eq!(sent.load(Ordering::SeqCst), 2);
        assert_eq!(results.get("slack"), Some(&false));
        assert_eq!(results.get("discord"), Some(&true));
    }
}
