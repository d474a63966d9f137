use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, Instrument};
use watch_state::BaselineStore;

use super::{load_baseline, Monitor};
use crate::adapter::PageSource;
use crate::aggregator::{ChangeAggregator, ChangeSet};
use crate::diff::{diff_content, ContentDiff};
use crate::domain::{Dimension, ResourceIdentity};
use crate::error::MonitorError;
use crate::fetch::RateLimitedFetcher;
use crate::obs;
use crate::scheduler::LoopState;

/// Monitors the content hash of one web page.
pub struct PageMonitor {
    url: String,
    identity: ResourceIdentity,
    source: Arc<dyn PageSource>,
    store: Arc<dyn BaselineStore>,
    fetcher: RateLimitedFetcher,
}

impl PageMonitor {
    pub fn new(url: &str, source: Arc<dyn PageSource>, store: Arc<dyn BaselineStore>) -> Self {
        Self {
            url: url.to_string(),
            identity: ResourceIdentity::new(url),
            source,
            store,
            fetcher: RateLimitedFetcher::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: RateLimitedFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn pass(&self) -> Result<ChangeSet, MonitorError> {
        obs::emit_pass_started(&self.identity);
        let previous = load_baseline(self.store.as_ref(), &self.identity);
        let mut agg = ChangeAggregator::new(self.identity.clone(), Utc::now());

        let sample = self
            .fetcher
            .fetch(Dimension::ContentHash.as_str(), || self.source.sample(&self.url))
            .await;

        match sample {
            Ok(sample) => {
                obs::emit_diffing(&self.identity, Dimension::ContentHash);
                match diff_content(&self.url, previous.as_ref(), &sample) {
                    ContentDiff::Bootstrap => {
                        obs::emit_bootstrap(&self.identity, Dimension::ContentHash, 1)
                    }
                    ContentDiff::Unchanged => info!(url = %self.url, "no content change"),
                    ContentDiff::Changed(change) => {
                        info!(
                            url = %self.url,
                            delta_bytes = change.content_length_change,
                            "content change detected"
                        );
                        agg.record_page_change(change);
                    }
                }

                let mut record = previous.unwrap_or_default();
                record.timestamp = Some(sample.fetched_at.to_rfc3339());
                record.hash = Some(sample.hash);
                record.status_code = Some(sample.status_code);
                record.content_length = Some(sample.content_length);

                obs::emit_loop_state(LoopState::Persisting);
                self.store.save(self.identity.as_str(), &record)?;
            }
            // A failed sample leaves the stored baseline untouched.
            Err(e) => agg.failed(Dimension::ContentHash, &e),
        }

        let set = agg.finish();
        obs::emit_pass_finished(&self.identity, set.item_count(), set.failed_dimensions.len());
        Ok(set)
    }
}

#[async_trait]
impl Monitor for PageMonitor {
    fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    async fn run_pass(&self) -> Result<ChangeSet, MonitorError> {
        let span = obs::pass_span(&self.identity);
        self.pass().instrument(span).await
    }
}
