//! Record store port - persistence abstraction for the user collection

use std::time::Duration;

use crate::domain::result::Result;
use crate::domain::{Snapshot, UserRecord};
use crate::lock::TransactionGuard;

/// Whole-collection user record persistence
///
/// The collection, not the individual record, is the unit of durability:
/// `save_all` replaces everything at once and a reader never observes a
/// partially written collection. Callers that load, mutate and save must
/// hold the guard returned by `begin` across the whole cycle.
pub trait RecordStore: Send + Sync {
    /// Load every record in insertion order
    ///
    /// A store that was never written yields an empty, non-persisted snapshot.
    fn load_all(&self) -> Result<Snapshot>;

    /// Atomically replace the persisted collection
    fn save_all(&self, records: &[UserRecord]) -> Result<()>;

    /// Enter the store's critical section, waiting at most `wait`
    fn begin(&self, wait: Duration) -> Result<TransactionGuard<'_>>;

    /// Human-readable location, for status output and diagnostics
    fn location(&self) -> String;
}
