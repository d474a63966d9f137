//! Severity policy: which kinds of change warrant which alert level.

use serde::{Deserialize, Serialize};
use watch_notify::Severity;

use crate::aggregator::ChangeSet;

/// A category of change a rule can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewCommits,
    NewReleases,
    NewTags,
    NewEvents,
    UpdatedIssues,
    PageContent,
}

fn non_empty<T>(items: &Option<Vec<T>>) -> bool {
    items.as_ref().is_some_and(|v| !v.is_empty())
}

impl ChangeKind {
    /// Whether `set` contains at least one change of this kind.
    pub fn present_in(&self, set: &ChangeSet) -> bool {
        match self {
            ChangeKind::NewCommits => non_empty(&set.new_commits),
            ChangeKind::NewReleases => non_empty(&set.new_releases),
            ChangeKind::NewTags => non_empty(&set.new_tags),
            ChangeKind::NewEvents => non_empty(&set.new_events),
            ChangeKind::UpdatedIssues => non_empty(&set.updated_issues),
            ChangeKind::PageContent => set.page_change.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityRule {
    pub kind: ChangeKind,
    pub severity: Severity,
}

/// Ordered rule table. The highest severity among matching rules wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    pub rules: Vec<SeverityRule>,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl SeverityPolicy {
    /// New releases are high; every other change is medium.
    pub fn standard() -> Self {
        let rule = |kind, severity| SeverityRule { kind, severity };
        Self {
            rules: vec![
                rule(ChangeKind::NewReleases, Severity::High),
                rule(ChangeKind::NewCommits, Severity::Medium),
                rule(ChangeKind::NewTags, Severity::Medium),
                rule(ChangeKind::NewEvents, Severity::Medium),
                rule(ChangeKind::UpdatedIssues, Severity::Medium),
                rule(ChangeKind::PageContent, Severity::Medium),
            ],
        }
    }

    pub fn with_rule(mut self, kind: ChangeKind, severity: Severity) -> Self {
        self.rules.push(SeverityRule { kind, severity });
        self
    }

    /// Severity for `set`, or `None` when nothing changed.
    ///
    /// A change no rule matches is reported at `Info`.
    pub fn evaluate(&self, set: &ChangeSet) -> Option<Severity> {
        if !set.has_changes() {
            return None;
        }
        self.rules
            .iter()
            .filter(|r| r.kind.present_in(set))
            .map(|r| r.severity)
            .max()
            .or(Some(Severity::Info))
    }
}
