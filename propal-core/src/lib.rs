//! Propal Core - user record store and account service
//!
//! This crate implements account creation, authentication and profile
//! editing following hexagonal architecture:
//!
//! - **domain**: User records, request types, errors
//! - **ports**: The RecordStore trait
//! - **services**: Account operations, credential hashing, event logging
//! - **adapters**: Concrete stores (JSON file, in-memory)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod lock;
mod log_migrations;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::JsonFileRecordStore;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{NewAccount, ProfileUpdate, Snapshot, UserProfile, UserRecord};
pub use domain::result::{Error, ErrorKind, OperationResult};
pub use ports::RecordStore;
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for Propal operations
///
/// Wires the configuration, the file-backed record store and the services
/// for one data directory.
pub struct PropalContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Arc<JsonFileRecordStore>,
    pub logging_service: Option<Arc<LoggingService>>,
    pub account_service: AccountService,
    pub status_service: StatusService,
}

impl PropalContext {
    /// Create a new Propal context
    ///
    /// The event log is optional: if logs.duckdb cannot be opened the
    /// context still works, just without logging.
    pub fn new(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let store = Arc::new(JsonFileRecordStore::new(config.store_path(data_dir)));

        let logging_service = LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION"))
            .ok()
            .map(Arc::new);

        let mut account_service = AccountService::new(store.clone(), &config)
            .context("Failed to initialize account service")?;
        if let Some(logger) = &logging_service {
            account_service = account_service.with_logger(Arc::clone(logger));
        }
        let status_service = StatusService::new(store.clone());

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store,
            logging_service,
            account_service,
            status_service,
        })
    }
}
