//! Turns a [`ChangeSet`] into the four fields the notification boundary
//! consumes.

use watch_notify::{Notification, Severity};

use crate::aggregator::ChangeSet;

fn joined<T>(items: &[T], label: impl Fn(&T) -> &str) -> String {
    items.iter().map(label).collect::<Vec<_>>().join(", ")
}

fn summary_parts(set: &ChangeSet) -> Vec<String> {
    let mut parts = Vec::new();

    if let Some(commits) = set.new_commits.as_deref().filter(|c| !c.is_empty()) {
        parts.push(format!("{} new commit(s)", commits.len()));
    }
    if let Some(releases) = set.new_releases.as_deref().filter(|r| !r.is_empty()) {
        parts.push(format!("new release(s): {}", joined(releases, |r| r.tag.as_str())));
    }
    if let Some(tags) = set.new_tags.as_deref().filter(|t| !t.is_empty()) {
        parts.push(format!("new tag(s): {}", joined(tags, |t| t.name.as_str())));
    }
    if let Some(events) = set.new_events.as_deref().filter(|e| !e.is_empty()) {
        parts.push(format!("{} new event(s)", events.len()));
    }
    if let Some(issues) = set.updated_issues.as_deref() {
        let prs = issues.iter().filter(|i| i.is_pr).count();
        let plain = issues.len() - prs;
        if plain > 0 {
            parts.push(format!("{plain} issue(s) updated"));
        }
        if prs > 0 {
            parts.push(format!("{prs} PR(s) updated"));
        }
    }
    parts
}

/// Build the notification for a non-empty change set.
pub fn compose_notification(set: &ChangeSet, severity: Severity) -> Notification {
    let timestamp = set.timestamp.to_rfc3339();

    if let Some(change) = &set.page_change {
        return Notification::new(
            format!("Page Content Changed: {}", change.url),
            format!(
                "Content hash changed ({:+} bytes)",
                change.content_length_change
            ),
            severity,
        )
        .with_detail("url", change.url.as_str())
        .with_detail("old_hash", change.old_hash.as_str())
        .with_detail("new_hash", change.new_hash.as_str())
        .with_detail("content_length_change", change.content_length_change)
        .with_detail("timestamp", timestamp);
    }

    let mut notification = Notification::new(
        format!("Repository Changes Detected: {}", set.resource),
        summary_parts(set).join(" | "),
        severity,
    )
    .with_detail("repository", set.resource.as_str())
    .with_detail("timestamp", timestamp);

    if let Some(comparison) = &set.file_changes {
        notification = notification
            .with_detail("files_changed", comparison.files.len() as u64)
            .with_detail("total_commits", comparison.total_commits);
    }
    notification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ContentChange;
    use crate::domain::{Comparison, FileChange, Issue, Release, ResourceIdentity};
    use chrono::Utc;

    fn issue(number: u64, is_pr: bool) -> Issue {
        Issue {
            number,
            title: format!("#{number}"),
            state: "open".to_string(),
            is_pr,
            user: "octo".to_string(),
            created: String::new(),
            updated: String::new(),
            labels: vec![],
            url: String::new(),
        }
    }

    fn release(tag: &str) -> Release {
        Release {
            id: 1,
            tag: tag.to_string(),
            name: tag.to_string(),
            published: None,
            prerelease: false,
            draft: false,
            author: "octo".to_string(),
            url: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn repository_message_lists_each_dimension() {
        let mut set = ChangeSet::new(ResourceIdentity::new("octo/hello"), Utc::now());
        set.new_releases = Some(vec![release("v1"), release("v2")]);
        set.updated_issues = Some(vec![issue(1, false), issue(2, true), issue(3, true)]);
        set.new_events = Some(vec![]);

        let n = compose_notification(&set, Severity::High);
        assert_eq!(n.title, "Repository Changes Detected: octo/hello");
        assert_eq!(
            n.message,
            "new release(s): v1, v2 | 1 issue(s) updated | 2 PR(s) updated"
        );
        assert_eq!(n.details["repository"], "octo/hello");
        assert!(n.details.contains_key("timestamp"));
        assert!(!n.details.contains_key("files_changed"));
    }

    #[test]
    fn comparison_adds_file_details() {
        let mut set = ChangeSet::new(ResourceIdentity::new("octo/hello"), Utc::now());
        set.new_commits = Some(vec![]);
        set.file_changes = Some(Comparison {
            status: "ahead".to_string(),
            ahead_by: 2,
            behind_by: 0,
            total_commits: 2,
            commits: vec![],
            files: vec![FileChange {
                filename: "a.rs".to_string(),
                status: "modified".to_string(),
                additions: 1,
                deletions: 0,
                changes: 1,
                patch: String::new(),
            }],
        });
        let n = compose_notification(&set, Severity::Medium);
        assert_eq!(n.details["files_changed"], 1);
        assert_eq!(n.details["total_commits"], 2);
    }

    #[test]
    fn page_change_message() {
        let mut set = ChangeSet::new(ResourceIdentity::new("https://example.com"), Utc::now());
        set.page_change = Some(ContentChange {
            url: "https://example.com".to_string(),
            old_hash: "aa".to_string(),
            new_hash: "bb".to_string(),
            old_timestamp: None,
            new_timestamp: "now".to_string(),
            content_length_change: -12,
        });
        let n = compose_notification(&set, Severity::Medium);
        assert_eq!(n.title, "Page Content Changed: https://example.com");
        assert_eq!(n.message, "Content hash changed (-12 bytes)");
        assert_eq!(n.details["new_hash"], "bb");
    }
}
