//! Resource adapters: the only code that talks to remote systems.
//!
//! Every list operation returns items newest first. The diff engine trims
//! against stored markers on that assumption, so an adapter that cannot
//! guarantee the order must sort before returning.

pub mod github;
pub mod http;
pub mod page;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Commit, Comparison, Issue, PageSample, Release, RepoEvent, RepoRef, Tag, TreeEntry};
use crate::error::FetchResult;

pub use github::GitHubClient;
pub use page::{parse_url_list, read_url_list, HttpPageSource};

/// Typed access to a code repository's dimensions.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Commits on `branch` (default branch when `None`) newer than `since`.
    async fn commits(
        &self,
        repo: &RepoRef,
        since: Option<&str>,
        branch: Option<&str>,
    ) -> FetchResult<Vec<Commit>>;

    async fn releases(&self, repo: &RepoRef, limit: u32) -> FetchResult<Vec<Release>>;

    async fn tags(&self, repo: &RepoRef, limit: u32) -> FetchResult<Vec<Tag>>;

    async fn events(&self, repo: &RepoRef, limit: u32) -> FetchResult<Vec<RepoEvent>>;

    /// Issues and pull requests updated since `since`, most recently
    /// updated first.
    async fn issues(
        &self,
        repo: &RepoRef,
        since: Option<DateTime<Utc>>,
    ) -> FetchResult<Vec<Issue>>;

    /// File-level comparison of `base...head`.
    async fn compare(&self, repo: &RepoRef, base: &str, head: &str) -> FetchResult<Comparison>;

    /// Blob entries of the tree at `reference`, recursively.
    async fn tree(&self, repo: &RepoRef, reference: &str) -> FetchResult<Vec<TreeEntry>>;
}

/// Samples a web page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn sample(&self, url: &str) -> FetchResult<PageSample>;
}
