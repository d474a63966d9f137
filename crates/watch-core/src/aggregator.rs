//! Change aggregation: one [`ChangeSet`] per resource per pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::ContentChange;
use crate::domain::{Comparison, Commit, Dimension, Issue, Release, RepoEvent, ResourceIdentity, Tag};
use crate::error::{FetchError, FetchResult};
use crate::metrics::METRICS;
use crate::obs;

/// Everything that changed for one resource in one pass.
///
/// A dimension field is `None` when the dimension was not fetched
/// successfully this pass, and `Some(vec![])` when it was fetched and had
/// nothing new. `None` fields are left out of the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub resource: ResourceIdentity,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_commits: Option<Vec<Commit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_releases: Option<Vec<Release>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_events: Option<Vec<RepoEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_issues: Option<Vec<Issue>>,
    /// File-level comparison between the previous and the newest commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_changes: Option<Comparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_change: Option<ContentChange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_dimensions: Vec<Dimension>,
}

fn count<T>(items: &Option<Vec<T>>) -> usize {
    items.as_ref().map_or(0, Vec::len)
}

impl ChangeSet {
    pub fn new(resource: ResourceIdentity, timestamp: DateTime<Utc>) -> Self {
        ChangeSet {
            resource,
            timestamp,
            new_commits: None,
            new_releases: None,
            new_tags: None,
            new_events: None,
            updated_issues: None,
            file_changes: None,
            page_change: None,
            failed_dimensions: Vec::new(),
        }
    }

    /// Number of new or updated items across all dimensions.
    pub fn item_count(&self) -> usize {
        count(&self.new_commits)
            + count(&self.new_releases)
            + count(&self.new_tags)
            + count(&self.new_events)
            + count(&self.updated_issues)
            + usize::from(self.page_change.is_some())
    }

    pub fn has_changes(&self) -> bool {
        self.item_count() > 0
    }

    pub fn is_degraded(&self) -> bool {
        !self.failed_dimensions.is_empty()
    }
}

/// `base...head` for the dependent file-level comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub base: String,
    pub head: String,
}

/// Collects per-dimension results of a pass into a [`ChangeSet`].
pub struct ChangeAggregator {
    set: ChangeSet,
    range: Option<CommitRange>,
}

impl ChangeAggregator {
    pub fn new(resource: ResourceIdentity, timestamp: DateTime<Utc>) -> Self {
        Self {
            set: ChangeSet::new(resource, timestamp),
            range: None,
        }
    }

    pub fn resource(&self) -> &ResourceIdentity {
        &self.set.resource
    }

    /// Record new commits. `prior` is the commit marker stored before this
    /// pass; the comparison range exists only when there was one and at
    /// least one commit is new.
    pub fn record_commits(&mut self, prior: Option<&str>, commits: Vec<Commit>) {
        self.range = match (prior, commits.first()) {
            (Some(base), Some(head)) => Some(CommitRange {
                base: base.to_string(),
                head: head.sha.clone(),
            }),
            _ => None,
        };
        self.set.new_commits = Some(commits);
    }

    pub fn record_releases(&mut self, releases: Vec<Release>) {
        self.set.new_releases = Some(releases);
    }

    pub fn record_tags(&mut self, tags: Vec<Tag>) {
        self.set.new_tags = Some(tags);
    }

    pub fn record_events(&mut self, events: Vec<RepoEvent>) {
        self.set.new_events = Some(events);
    }

    pub fn record_issues(&mut self, issues: Vec<Issue>) {
        self.set.updated_issues = Some(issues);
    }

    pub fn record_page_change(&mut self, change: ContentChange) {
        self.set.page_change = Some(change);
    }

    /// Mark `dimension` as failed for this pass.
    pub fn failed(&mut self, dimension: Dimension, err: &FetchError) {
        obs::emit_dimension_failed(&self.set.resource, dimension, err);
        METRICS.inc_dimensions_failed();
        if !self.set.failed_dimensions.contains(&dimension) {
            self.set.failed_dimensions.push(dimension);
        }
    }

    pub fn comparison_range(&self) -> Option<&CommitRange> {
        self.range.as_ref()
    }

    /// Attach the comparison result. A failed comparison leaves
    /// `file_changes` empty and does not fail the commits dimension.
    pub fn attach_comparison(&mut self, result: FetchResult<Comparison>) {
        match result {
            Ok(comparison) => self.set.file_changes = Some(comparison),
            Err(e) => {
                tracing::warn!(
                    resource = %self.set.resource,
                    error = %e,
                    "file-level comparison unavailable"
                );
            }
        }
    }

    pub fn finish(self) -> ChangeSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: format!("commit {sha}"),
            author: "octo".to_string(),
            date: "2025-01-01T00:00:00Z".to_string(),
            url: String::new(),
        }
    }

    fn aggregator() -> ChangeAggregator {
        ChangeAggregator::new(ResourceIdentity::new("octo/hello"), Utc::now())
    }

    #[test]
    fn range_runs_from_prior_marker_to_newest_commit() {
        let mut agg = aggregator();
        agg.record_commits(Some("old"), vec![commit("c3"), commit("c2")]);
        assert_eq!(
            agg.comparison_range(),
            Some(&CommitRange {
                base: "old".to_string(),
                head: "c3".to_string()
            })
        );
    }

    #[test]
    fn no_range_without_prior_or_new_commits() {
        let mut agg = aggregator();
        agg.record_commits(None, vec![]);
        assert!(agg.comparison_range().is_none());

        agg.record_commits(Some("old"), vec![]);
        assert!(agg.comparison_range().is_none());
    }

    #[test]
    fn failed_comparison_degrades_silently() {
        let mut agg = aggregator();
        agg.record_commits(Some("old"), vec![commit("c1")]);
        agg.attach_comparison(Err(FetchError::Fatal("404".to_string())));
        let set = agg.finish();
        assert!(set.file_changes.is_none());
        assert!(set.failed_dimensions.is_empty());
        assert_eq!(set.item_count(), 1);
    }

    #[test]
    fn failed_dimension_is_absent_from_export() {
        let mut agg = aggregator();
        agg.record_commits(None, vec![]);
        agg.failed(Dimension::Releases, &FetchError::Transient("timeout".to_string()));
        agg.failed(Dimension::Releases, &FetchError::Transient("timeout".to_string()));
        let set = agg.finish();

        let value = serde_json::to_value(&set).unwrap();
        assert!(value.get("new_releases").is_none());
        assert_eq!(value["new_commits"], serde_json::json!([]));
        assert_eq!(value["failed_dimensions"], serde_json::json!(["releases"]));
        assert!(!set.has_changes());
        assert!(set.is_degraded());
    }
}
