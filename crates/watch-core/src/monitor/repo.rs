use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::Instrument;
use watch_state::BaselineStore;

use super::{load_baseline, Monitor};
use crate::adapter::RepoSource;
use crate::aggregator::{ChangeAggregator, ChangeSet};
use crate::config::WindowLimits;
use crate::diff::{diff_ordered, diff_since, DimensionDiff, Keyed};
use crate::domain::{Dimension, RepoRef, ResourceIdentity};
use crate::error::{FetchResult, MonitorError};
use crate::fetch::RateLimitedFetcher;
use crate::obs;
use crate::scheduler::LoopState;

/// Monitors one repository's commits, releases, tags, events and issues.
pub struct RepoMonitor {
    repo: RepoRef,
    identity: ResourceIdentity,
    source: Arc<dyn RepoSource>,
    store: Arc<dyn BaselineStore>,
    fetcher: RateLimitedFetcher,
    limits: WindowLimits,
    pacing: Duration,
    branch: Option<String>,
}

impl RepoMonitor {
    pub fn new(repo: RepoRef, source: Arc<dyn RepoSource>, store: Arc<dyn BaselineStore>) -> Self {
        Self {
            identity: repo.identity(),
            repo,
            source,
            store,
            fetcher: RateLimitedFetcher::default(),
            limits: WindowLimits::default(),
            pacing: Duration::from_secs(1),
            branch: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: RateLimitedFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_limits(mut self, limits: WindowLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Delay between consecutive requests within a pass.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    async fn pause(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }

    fn observe<T, M>(&self, dimension: Dimension, diff: &DimensionDiff<T, M>, observed: usize) {
        if diff.bootstrapped {
            obs::emit_bootstrap(&self.identity, dimension, observed);
        }
        if diff.window_exceeded {
            obs::emit_window_exceeded(&self.identity, dimension, diff.new_items.len());
        }
    }

    /// Fetch a newest-first dimension and trim it against `stored`.
    async fn fetch_ordered<T, F, Fut>(
        &self,
        dimension: Dimension,
        stored: Option<&T::Marker>,
        call: F,
    ) -> FetchResult<DimensionDiff<T, T::Marker>>
    where
        T: Keyed,
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchResult<Vec<T>>>,
    {
        let snapshot = self.fetcher.fetch(dimension.as_str(), call).await?;
        let observed = snapshot.len();
        obs::emit_diffing(&self.identity, dimension);
        let diff = diff_ordered(snapshot, stored);
        self.observe(dimension, &diff, observed);
        Ok(diff)
    }

    async fn pass(&self) -> Result<ChangeSet, MonitorError> {
        obs::emit_pass_started(&self.identity);
        let mut record = load_baseline(self.store.as_ref(), &self.identity).unwrap_or_default();
        let mut agg = ChangeAggregator::new(self.identity.clone(), Utc::now());

        // Commits, plus the file-level comparison that depends on them.
        let prior_sha = record.last_commit_sha.clone();
        let since = record.last_commit_date.clone();
        let commits = self
            .fetcher
            .fetch(Dimension::Commits.as_str(), || {
                self.source
                    .commits(&self.repo, since.as_deref(), self.branch.as_deref())
            })
            .await;
        match commits {
            Ok(snapshot) => {
                let observed = snapshot.len();
                let newest_date = snapshot.first().map(|c| c.date.clone());
                obs::emit_diffing(&self.identity, Dimension::Commits);
                let diff = diff_ordered(snapshot, prior_sha.as_ref());
                self.observe(Dimension::Commits, &diff, observed);
                if diff.new_marker.is_some() {
                    record.last_commit_sha = diff.new_marker;
                }
                if newest_date.is_some() {
                    record.last_commit_date = newest_date;
                }
                agg.record_commits(prior_sha.as_deref(), diff.new_items);
            }
            Err(e) => agg.failed(Dimension::Commits, &e),
        }

        if let Some(range) = agg.comparison_range().cloned() {
            self.pause().await;
            let comparison = self
                .fetcher
                .fetch("compare", || {
                    self.source.compare(&self.repo, &range.base, &range.head)
                })
                .await;
            agg.attach_comparison(comparison);
        }

        self.pause().await;
        let releases = self
            .fetch_ordered(Dimension::Releases, record.last_release_id.as_ref(), || {
                self.source.releases(&self.repo, self.limits.releases)
            })
            .await;
        match releases {
            Ok(diff) => {
                if diff.new_marker.is_some() {
                    record.last_release_id = diff.new_marker;
                }
                agg.record_releases(diff.new_items);
            }
            Err(e) => agg.failed(Dimension::Releases, &e),
        }

        self.pause().await;
        let tags = self
            .fetch_ordered(Dimension::Tags, record.last_tag.as_ref(), || {
                self.source.tags(&self.repo, self.limits.tags)
            })
            .await;
        match tags {
            Ok(diff) => {
                if diff.new_marker.is_some() {
                    record.last_tag = diff.new_marker;
                }
                agg.record_tags(diff.new_items);
            }
            Err(e) => agg.failed(Dimension::Tags, &e),
        }

        self.pause().await;
        let events = self
            .fetch_ordered(Dimension::Events, record.last_event_id.as_ref(), || {
                self.source.events(&self.repo, self.limits.events)
            })
            .await;
        match events {
            Ok(diff) => {
                if diff.new_marker.is_some() {
                    record.last_event_id = diff.new_marker;
                }
                agg.record_events(diff.new_items);
            }
            Err(e) => agg.failed(Dimension::Events, &e),
        }

        // Issues are keyed by check time rather than by item.
        self.pause().await;
        let last_check = record.last_issue_check;
        let checked_at = Utc::now();
        let issues = self
            .fetcher
            .fetch(Dimension::Issues.as_str(), || {
                self.source.issues(&self.repo, last_check)
            })
            .await;
        match issues {
            Ok(snapshot) => {
                let observed = snapshot.len();
                obs::emit_diffing(&self.identity, Dimension::Issues);
                let diff = diff_since(snapshot, last_check, checked_at);
                self.observe(Dimension::Issues, &diff, observed);
                record.last_issue_check = diff.new_marker;
                agg.record_issues(diff.new_items);
            }
            Err(e) => agg.failed(Dimension::Issues, &e),
        }

        obs::emit_loop_state(LoopState::Persisting);
        self.store.save(self.identity.as_str(), &record)?;

        let set = agg.finish();
        obs::emit_pass_finished(&self.identity, set.item_count(), set.failed_dimensions.len());
        Ok(set)
    }
}

#[async_trait]
impl Monitor for RepoMonitor {
    fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    async fn run_pass(&self) -> Result<ChangeSet, MonitorError> {
        let span = obs::pass_span(&self.identity);
        self.pass().instrument(span).await
    }
}
