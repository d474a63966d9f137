//! SMTP email channel.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::SmtpConfig;
use crate::notifier::{Notification, Notifier};
use crate::payload;
use crate::Result;

/// Sends plain-text mail through an authenticated STARTTLS relay.
pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    /// Addresses are validated here so a bad recipient fails at startup,
    /// not on the first alert. No connection is opened until `send`.
    pub fn new(smtp: &SmtpConfig, to: &str, timeout: Duration) -> Result<Self> {
        let from: Mailbox = smtp.user.parse()?;
        let to: Mailbox = to.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)?
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.password.clone()))
            .timeout(Some(timeout))
            .build();

        Ok(EmailNotifier { from, to, transport })
    }

    fn message(&self, notification: &Notification) -> Result<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(payload::email_subject(notification))
            .header(ContentType::TEXT_PLAIN)
            .body(payload::email_body(notification, Utc::now()))?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.message(notification)?;
        let response = self.transport.send(message).await?;
        debug!(channel = "email", code = %response.code(), "notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NotifyError, Severity};

    fn smtp() -> SmtpConfig {
        SmtpConfig::new("alerts@example.test", "secret").with_server("mail.example.test", 2525)
    }

    #[tokio::test]
    async fn rejects_invalid_recipient() {
        let err = EmailNotifier::new(&smtp(), "not an address", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, NotifyError::Email(_)));
    }

    #[tokio::test]
    async fn builds_message_with_alert_subject() {
        let notifier = EmailNotifier::new(&smtp(), "soc@example.test", Duration::from_secs(5)).unwrap();
        let n = Notification::new(
            "Page Content Changed: https://example.test",
            "Content hash changed (+9 bytes)",
            Severity::Medium,
        );

        let raw = String::from_utf8(notifier.message(&n).unwrap().formatted()).unwrap();
        assert!(raw.contains("Subject: [ASM Alert] Page Content Changed: https://example.test"));
        assert!(raw.contains("To: soc@example.test"));
        assert!(raw.contains("From: alerts@example.test"));
        assert_eq!(notifier.name(), "email");
    }
}
