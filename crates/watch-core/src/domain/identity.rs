//! Resource identities.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Opaque key of a monitored target, e.g. `"owner/repo"` or a page URL.
///
/// Used verbatim as the baseline lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        ResourceIdentity(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form: every run of characters outside
    /// `[A-Za-z0-9.-]` becomes a single `_`.
    pub fn file_stem(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut last_underscore = false;
        for c in self.0.chars() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                out.push(c);
                last_underscore = false;
            } else if !last_underscore {
                out.push('_');
                last_underscore = true;
            }
        }
        out.trim_matches('_').to_string()
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn owner_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").expect("valid owner pattern"))
}

fn repo_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").expect("valid repo pattern"))
}

/// A GitHub repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Self {
        RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse `owner/repo`. Anything else is a configuration error.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidIdentity(format!("{s:?} is not in owner/repo format"));
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if name.contains('/') || !owner_pattern().is_match(owner) || !repo_pattern().is_match(name)
        {
            return Err(invalid());
        }
        Ok(RepoRef::new(owner, name))
    }

    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(self.to_string())
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoRef::parse(s)
    }
}
