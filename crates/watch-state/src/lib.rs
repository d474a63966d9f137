//! Watch-State: baseline persistence for ASM Watch
//!
//! This crate owns the only durable state of the monitor: for every watched
//! resource, the last-seen marker of each tracked dimension.
//!
//! ## Key Components
//!
//! - `BaselineRecord`: per-resource markers (commit SHA, release id, tag,
//!   event id, issue check time, page content hash)
//! - `BaselineStore`: load/save contract keyed by resource identity
//! - `JsonFileStore`: single JSON document on disk, replaced atomically
//! - `MemoryBaselineStore`: in-memory fake for tests

mod error;
pub mod fakes;
pub mod file_store;
mod schema;
pub mod storage_traits;

pub use error::StoreError;
pub use fakes::MemoryBaselineStore;
pub use file_store::JsonFileStore;
pub use schema::BaselineRecord;
pub use storage_traits::{BaselineStore, StoreResult};
