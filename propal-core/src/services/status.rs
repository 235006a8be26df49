//! Status service - record store summary

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::RecordStore;
use crate::services::credentials::is_hashed;

/// Status service for store summaries
pub struct StatusService {
    store: Arc<dyn RecordStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let snapshot = self.store.load_all()?;

        let mut per_email: HashMap<&str, usize> = HashMap::new();
        for record in &snapshot.records {
            *per_email.entry(record.email.as_str()).or_default() += 1;
        }

        Ok(StatusSummary {
            location: self.store.location(),
            initialized: snapshot.persisted,
            total_users: snapshot.records.len(),
            legacy_credentials: snapshot
                .records
                .iter()
                .filter(|r| !is_hashed(&r.password))
                .count(),
            // Written by the unlocked legacy system; new writes cannot produce these
            duplicate_emails: per_email.values().filter(|&&n| n > 1).count(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub location: String,
    pub initialized: bool,
    pub total_users: usize,
    pub legacy_credentials: usize,
    pub duplicate_emails: usize,
}
