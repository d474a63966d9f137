//! Notification channel configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP relay used by the email channel. Connections always upgrade with
/// STARTTLS before authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl SmtpConfig {
    pub fn new(user: &str, password: &str) -> Self {
        SmtpConfig {
            server: DEFAULT_SMTP_SERVER.to_string(),
            port: DEFAULT_SMTP_PORT,
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub fn with_server(mut self, server: &str, port: u16) -> Self {
        self.server = server.to_string();
        self.port = port;
        self
    }

    /// Build from `SMTP_SERVER`, `SMTP_PORT`, `SMTP_USER` and
    /// `SMTP_PASSWORD` as returned by `var`. Without both credentials there
    /// is no email channel.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, NotifyError> {
        let (Some(user), Some(password)) = (var("SMTP_USER"), var("SMTP_PASSWORD")) else {
            return Ok(None);
        };
        let server = var("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string());
        let port = match var("SMTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| NotifyError::Config(format!("SMTP_PORT is not a port number: {raw}")))?,
            None => DEFAULT_SMTP_PORT,
        };
        Ok(Some(SmtpConfig {
            server,
            port,
            user,
            password,
        }))
    }
}

/// Which channels are configured and where they post to.
///
/// Channels with no URL are simply not used. Email needs both SMTP
/// credentials and a recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub slack_webhook: Option<String>,
    pub teams_webhook: Option<String>,
    pub discord_webhook: Option<String>,
    /// Generic JSON webhook
    pub webhook_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub email_to: Option<String>,
    /// Per-request timeout
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            slack_webhook: None,
            teams_webhook: None,
            discord_webhook: None,
            webhook_url: None,
            smtp: None,
            email_to: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl NotifyConfig {
    /// Read channel settings from the environment: `SLACK_WEBHOOK`,
    /// `TEAMS_WEBHOOK`, `DISCORD_WEBHOOK`, `ASM_WEBHOOK_URL`, `ASM_EMAIL_TO`
    /// and the `SMTP_*` variables. Empty values count as unset.
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NotifyError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(NotifyConfig {
            slack_webhook: var("SLACK_WEBHOOK"),
            teams_webhook: var("TEAMS_WEBHOOK"),
            discord_webhook: var("DISCORD_WEBHOOK"),
            webhook_url: var("ASM_WEBHOOK_URL"),
            smtp: SmtpConfig::from_vars(&var)?,
            email_to: var("ASM_EMAIL_TO"),
            ..Default::default()
        })
    }

    pub fn with_slack(mut self, url: &str) -> Self {
        self.slack_webhook = Some(url.to_string());
        self
    }

    pub fn with_teams(mut self, url: &str) -> Self {
        self.teams_webhook = Some(url.to_string());
        self
    }

    pub fn with_discord(mut self, url: &str) -> Self {
        self.discord_webhook = Some(url.to_string());
        self
    }

    pub fn with_webhook(mut self, url: &str) -> Self {
        self.webhook_url = Some(url.to_string());
        self
    }

    pub fn with_smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = Some(smtp);
        self
    }

    pub fn with_email_to(mut self, recipient: &str) -> Self {
        self.email_to = Some(recipient.to_string());
        self
    }

    /// True when email can actually be sent.
    pub fn email_ready(&self) -> bool {
        self.smtp.is_some() && self.email_to.is_some()
    }

    /// Drop every channel `selection` does not name.
    pub fn select(mut self, selection: ChannelSelection) -> Self {
        let keep = |c: ChannelSelection| selection == ChannelSelection::All || selection == c;
        if !keep(ChannelSelection::Slack) {
            self.slack_webhook = None;
        }
        if !keep(ChannelSelection::Teams) {
            self.teams_webhook = None;
        }
        if !keep(ChannelSelection::Discord) {
            self.discord_webhook = None;
        }
        if !keep(ChannelSelection::Webhook) {
            self.webhook_url = None;
        }
        if !keep(ChannelSelection::Email) {
            self.smtp = None;
            self.email_to = None;
        }
        self
    }

    /// True when no channel is configured.
    pub fn is_empty(&self) -> bool {
        self.slack_webhook.is_none()
            && self.teams_webhook.is_none()
            && self.discord_webhook.is_none()
            && self.webhook_url.is_none()
            && !self.email_ready()
    }
}

/// A single channel, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSelection {
    All,
    Slack,
    Teams,
    Discord,
    Email,
    Webhook,
}

impl ChannelSelection {
    pub const ALL: [ChannelSelection; 6] = [
        ChannelSelection::All,
        ChannelSelection::Slack,
        ChannelSelection::Teams,
        ChannelSelection::Discord,
        ChannelSelection::Email,
        ChannelSelection::Webhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelSelection::All => "all",
            ChannelSelection::Slack => "slack",
            ChannelSelection::Teams => "teams",
            ChannelSelection::Discord => "discord",
            ChannelSelection::Email => "email",
            ChannelSelection::Webhook => "webhook",
        }
    }
}

impl fmt::Display for ChannelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelSelection {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelSelection::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NotifyError::UnknownChannel(s.to_string()))
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
