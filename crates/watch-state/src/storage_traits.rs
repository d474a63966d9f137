//! Storage trait for baselines.
//!
//! A baseline store maps a resource identity to its [`BaselineRecord`].
//! Implementations must make `save` atomic with respect to process crashes:
//! after a crash the store holds either the previous record or the new one,
//! never a torn write. Concurrent writers for the same identity are not
//! supported; callers run one writer per state file.

use crate::error::StoreError;
use crate::schema::BaselineRecord;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Keyed baseline persistence.
///
/// Guarantees:
/// - `load` of an identity never saved returns `Ok(None)`.
/// - `load` after `save(id, r)` returns `Ok(Some(r))`, also across restarts
///   for durable implementations.
/// - `save` for one identity leaves other identities' records untouched.
pub trait BaselineStore: Send + Sync {
    /// Load the baseline for `identity`, or `None` if nothing is stored.
    fn load(&self, identity: &str) -> StoreResult<Option<BaselineRecord>>;

    /// Replace the baseline for `identity`.
    fn save(&self, identity: &str, record: &BaselineRecord) -> StoreResult<()>;

    /// Drop the baseline for `identity`. No-op if absent.
    fn remove(&self, identity: &str) -> StoreResult<()>;
}
