//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod snapshot;
mod user;
pub mod result;

pub use snapshot::Snapshot;
pub use user::{NewAccount, ProfileUpdate, UserProfile, UserRecord};
