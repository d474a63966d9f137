//! Items returned by resource adapters.
//!
//! These are the normalised shapes that end up in exported change sets; raw
//! API payloads are mapped into them inside the adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A commit on the monitored branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    pub author: String,
    /// Author date as reported by the API (ISO-8601)
    pub date: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag: String,
    pub name: String,
    pub published: Option<String>,
    pub prerelease: bool,
    pub draft: bool,
    pub author: String,
    pub url: String,
    /// Release notes, truncated
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub sha: String,
}

/// A repository activity event (push, fork, issue comment, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: String,
    pub created: String,
    pub payload_action: String,
    pub payload_ref: String,
    pub payload_size: u64,
}

/// An issue or pull request updated since the last check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub is_pr: bool,
    pub user: String,
    pub created: String,
    pub updated: String,
    pub labels: Vec<String>,
    pub url: String,
}

/// Commit entry inside a range comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    /// Unified diff, truncated
    pub patch: String,
}

/// File-level diff between two commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub status: String,
    pub ahead_by: u64,
    pub behind_by: u64,
    pub total_commits: u64,
    pub commits: Vec<CommitSummary>,
    pub files: Vec<FileChange>,
}

/// A blob in a repository tree listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    pub size: u64,
}

/// One observation of a web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSample {
    /// SHA-256 of the body, lowercase hex
    pub hash: String,
    pub status_code: u16,
    /// Body length in bytes
    pub content_length: u64,
    pub fetched_at: DateTime<Utc>,
}

impl PageSample {
    pub fn from_body(body: &[u8], status_code: u16, fetched_at: DateTime<Utc>) -> Self {
        PageSample {
            hash: hex::encode(Sha256::digest(body)),
            status_code,
            content_length: body.len() as u64,
            fetched_at,
        }
    }
}

/// First line of a message.
pub(crate) fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().to_string()
}

/// At most `max` characters of `s`, never splitting a character.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
