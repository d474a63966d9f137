//! Severity scale and the per-channel colour tables.
//!
//! Each channel's mapping is defined exactly once here; payload builders
//! look colours up through these functions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    /// Slack attachment colour.
    pub fn slack_color(&self) -> &'static str {
        match self {
            Severity::Critical => "danger",
            Severity::High => "warning",
            Severity::Medium => "#FFA500",
            Severity::Low => "good",
            Severity::Info => "#36a64f",
        }
    }

    /// Teams MessageCard theme colour (hex without `#`).
    pub fn teams_color(&self) -> &'static str {
        match self {
            Severity::Critical => "FF0000",
            Severity::High => "FF9900",
            Severity::Medium => "FFCC00",
            Severity::Low => "00FF00",
            Severity::Info => "0078D4",
        }
    }

    /// Discord embed colour.
    pub fn discord_color(&self) -> u32 {
        match self {
            Severity::Critical => 0xFF0000,
            Severity::High => 0xFF9900,
            Severity::Medium => 0xFFCC00,
            Severity::Low => 0x00FF00,
            Severity::Info => 0x0099FF,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = NotifyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NotifyError::UnknownSeverity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_scale() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn parse_and_display_agree() {
        for sev in Severity::ALL {
            assert_eq!(sev.to_string().parse::<Severity>().unwrap(), sev);
        }
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"medium\"");
        let parsed: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
    }

    #[test]
    fn colour_tables_are_distinct_per_channel() {
        assert_eq!(Severity::Critical.slack_color(), "danger");
        assert_eq!(Severity::Info.teams_color(), "0078D4");
        assert_eq!(Severity::Info.discord_color(), 0x0099FF);
        assert_ne!(
            Severity::High.discord_color(),
            Severity::Medium.discord_color()
        );
    }
}
