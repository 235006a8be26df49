//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - A pretty-printed JSON file for the RecordStore port
//! - Process memory for the RecordStore port (tests, embedding)

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileRecordStore;
pub use memory::MemoryRecordStore;
