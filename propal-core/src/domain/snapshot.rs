//! Loaded view of the record collection

use uuid::Uuid;

use super::result::{Error, Result};
use super::user::UserRecord;

/// The full record collection as read at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Records in insertion order
    pub records: Vec<UserRecord>,
    /// False when nothing has ever been persisted
    pub persisted: bool,
}

impl Snapshot {
    /// A store that was never written
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            persisted: false,
        }
    }

    pub fn persisted(records: Vec<UserRecord>) -> Self {
        Self {
            records,
            persisted: true,
        }
    }

    /// Fail with `StoreEmpty` if the store was never initialized
    pub fn require_persisted(&self) -> Result<()> {
        if self.persisted {
            Ok(())
        } else {
            Err(Error::StoreEmpty)
        }
    }

    pub fn position_of(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn contains_id(&self, id: Uuid) -> bool {
        self.position_of(id).is_some()
    }

    /// Whether `email` belongs to a record other than `except`
    ///
    /// Comparison is exact, case included.
    pub fn email_in_use(&self, email: &str, except: Option<Uuid>) -> bool {
        self.records
            .iter()
            .any(|r| r.email == email && Some(r.id) != except)
    }

    /// Records registered under `email`, in insertion order
    pub fn with_email<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a UserRecord> + 'a {
        self.records.iter().filter(move |r| r.email == email)
    }
}
