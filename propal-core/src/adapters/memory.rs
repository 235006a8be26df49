//! In-memory record store for tests and embedding

use std::sync::Mutex;
use std::time::Duration;

use crate::domain::result::Result;
use crate::domain::{Snapshot, UserRecord};
use crate::lock::{StoreLock, TransactionGuard};
use crate::ports::RecordStore;

/// Record store that keeps the collection in process memory
#[derive(Debug)]
pub struct MemoryRecordStore {
    // None until the first save, mirroring a file that does not exist yet
    records: Mutex<Option<Vec<UserRecord>>>,
    lock: StoreLock,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(None),
            lock: StoreLock::in_process(),
        }
    }

    /// Start from an already persisted collection
    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
            lock: StoreLock::in_process(),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_all(&self) -> Result<Snapshot> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        Ok(match records.as_ref() {
            Some(records) => Snapshot::persisted(records.clone()),
            None => Snapshot::empty(),
        })
    }

    fn save_all(&self, records: &[UserRecord]) -> Result<()> {
        let mut stored = self.records.lock().unwrap_or_else(|p| p.into_inner());
        *stored = Some(records.to_vec());
        Ok(())
    }

    fn begin(&self, wait: Duration) -> Result<TransactionGuard<'_>> {
        self.lock.acquire(wait)
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
