//! In-memory fake for [`BaselineStore`] (testing only)

use std::collections::HashMap;
use std::sync::Mutex;

use crate::schema::BaselineRecord;
use crate::storage_traits::{BaselineStore, StoreResult};

/// In-memory baseline store backed by a `HashMap<identity, record>`.
#[derive(Debug, Default)]
pub struct MemoryBaselineStore {
    records: Mutex<HashMap<String, BaselineRecord>>,
    saves: Mutex<u64>,
}

impl MemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a save.
    pub fn with_record(self, identity: &str, record: BaselineRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(identity.to_string(), record);
        self
    }

    /// Number of `save` calls observed so far.
    pub fn save_count(&self) -> u64 {
        *self.saves.lock().unwrap()
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn load(&self, identity: &str) -> StoreResult<Option<BaselineRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(identity).cloned())
    }

    fn save(&self, identity: &str, record: &BaselineRecord) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(identity.to_string(), record.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn remove(&self, identity: &str) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        records.remove(identity);
        Ok(())
    }
}
