//! Configuration structs handed to components at construction.
//!
//! Environment variables are only consulted by the `from_env` constructors;
//! components never look anything up on their own.

use std::time::Duration;

/// GitHub API access.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub user_agent: String,
    /// Bound on every single request
    pub request_timeout: Duration,
    pub commits_per_page: u32,
    pub issues_per_page: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            token: None,
            api_base: "https://api.github.com".to_string(),
            user_agent: concat!("asm-watch/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
            commits_per_page: 100,
            issues_per_page: 100,
        }
    }
}

impl GitHubConfig {
    /// Defaults plus `GITHUB_TOKEN` from the environment.
    pub fn from_env() -> Self {
        GitHubConfig {
            token: std::env::var("GITHUB_TOKEN").ok(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

/// How many of the newest releases, tags and events a repository pass asks
/// for. A stored marker older than this window cannot be found again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    pub releases: u32,
    pub tags: u32,
    pub events: u32,
}

impl Default for WindowLimits {
    fn default() -> Self {
        WindowLimits {
            releases: 10,
            tags: 10,
            events: 50,
        }
    }
}

/// Web page sampling.
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Sample pages even when their TLS certificate does not verify
    pub accept_invalid_certs: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            user_agent: "Mozilla/5.0 (ASM Monitor Bot)".to_string(),
            request_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
        }
    }
}

/// How long the fetcher waits when an API throttles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Used when the API does not advertise a reset time
    pub default_wait: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            default_wait: Duration::from_secs(60),
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(3600),
        }
    }
}

/// Watch loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Fixed delay between the end of one pass and the start of the next
    pub interval: Duration,
    /// Delay between monitors inside one pass
    pub resource_pacing: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            interval: Duration::from_secs(300),
            resource_pacing: Duration::from_secs(1),
        }
    }
}

impl ScheduleSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_resource_pacing(mut self, pacing: Duration) -> Self {
        self.resource_pacing = pacing;
        self
    }
}
