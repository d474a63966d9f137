//! Rate-limit aware wrapper around adapter calls.
//!
//! On a throttling response the fetcher waits until the advertised reset
//! (at least `min_wait`, at most `max_wait`) and retries exactly once. Any
//! other failure is handed straight back so the caller can mark that one
//! dimension as failed for the pass.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::FetchPolicy;
use crate::error::{FetchError, FetchResult};
use crate::metrics::METRICS;

#[derive(Debug, Clone, Default)]
pub struct RateLimitedFetcher {
    policy: FetchPolicy,
}

impl RateLimitedFetcher {
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// How long to sleep for a throttle advertising `retry_at`, seen at `now`.
    pub fn throttle_wait(&self, retry_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        let wait = match retry_at {
            Some(at) => (at - now).to_std().unwrap_or(Duration::ZERO),
            None => self.policy.default_wait,
        };
        wait.clamp(self.policy.min_wait, self.policy.max_wait)
    }

    /// Run `call`, retrying once after a throttle.
    pub async fn fetch<T, F, Fut>(&self, label: &str, mut call: F) -> FetchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        match call().await {
            Err(FetchError::Throttled { retry_at }) => {
                let wait = self.throttle_wait(retry_at, Utc::now());
                METRICS.inc_throttle_waits();
                warn!(
                    fetch = label,
                    wait_secs = wait.as_secs(),
                    "rate limit hit, waiting before retry"
                );
                tokio::time::sleep(wait).await;

                let retried = call().await;
                if let Err(e) = &retried {
                    warn!(fetch = label, error = %e, "retry after rate limit failed");
                }
                retried
            }
            Err(e) => {
                debug!(fetch = label, error = %e, "fetch failed");
                Err(e)
            }
            ok => ok,
        }
    }
}
