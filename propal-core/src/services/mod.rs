//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
pub mod credentials;
pub mod logging;
mod status;

pub use account::AccountService;
pub use credentials::{CredentialHasher, Verification};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use status::{StatusService, StatusSummary};
