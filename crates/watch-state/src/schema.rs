//! On-disk schema of a single resource's baseline.
//!
//! The state file is a JSON object keyed by resource identity
//! (`"owner/repo"` or a page URL). Each value is a [`BaselineRecord`]. Field
//! names match the files written by earlier versions of the monitor so that
//! existing baselines keep working.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-seen markers for one monitored resource.
///
/// Every field is optional: a missing field means "no baseline yet" for that
/// dimension, and the next pass bootstraps it instead of reporting history.
/// Fields this version does not know about are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    /// SHA of the newest commit seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_sha: Option<String>,

    /// Author date of the newest commit seen, used as the `since` filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_date: Option<String>,

    /// Id of the newest release seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_release_id: Option<u64>,

    /// Name of the newest tag seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tag: Option<String>,

    /// Id of the newest repository event seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event_id: Option<String>,

    /// When issues and pull requests were last checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_issue_check: Option<DateTime<Utc>>,

    /// SHA-256 of the last page body (page monitoring)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// HTTP status of the last page sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Body length in bytes of the last page sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,

    /// When the last page sample was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Unrecognised fields, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl BaselineRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no dimension has a marker yet.
    pub fn is_empty(&self) -> bool {
        self.last_commit_sha.is_none()
            && self.last_commit_date.is_none()
            && self.last_release_id.is_none()
            && self.last_tag.is_none()
            && self.last_event_id.is_none()
            && self.last_issue_check.is_none()
            && self.hash.is_none()
            && self.status_code.is_none()
            && self.content_length.is_none()
            && self.timestamp.is_none()
            && self.extra.is_empty()
    }
}
