//! Per-resource monitoring passes.

mod page;
mod repo;

use async_trait::async_trait;
use watch_state::{BaselineRecord, BaselineStore};

use crate::aggregator::ChangeSet;
use crate::domain::ResourceIdentity;
use crate::error::MonitorError;
use crate::obs;

pub use page::PageMonitor;
pub use repo::RepoMonitor;

/// One monitored resource: fetch, diff against the baseline, persist.
#[async_trait]
pub trait Monitor: Send + Sync {
    fn identity(&self) -> &ResourceIdentity;

    /// Run one pass. Per-dimension fetch failures are recorded in the
    /// returned change set; only store and configuration failures are
    /// errors.
    async fn run_pass(&self) -> Result<ChangeSet, MonitorError>;
}

/// Load the stored baseline, treating an unreadable store as empty.
pub(crate) fn load_baseline(
    store: &dyn BaselineStore,
    identity: &ResourceIdentity,
) -> Option<BaselineRecord> {
    match store.load(identity.as_str()) {
        Ok(record) => record,
        Err(e) => {
            obs::emit_baseline_degraded(identity, &e);
            None
        }
    }
}
