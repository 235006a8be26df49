//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// One variant per failure kind the account operations can report. The
/// `Display` text is meant for operators; callers facing end users should
/// go through [`Error::public_message`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("No users found")]
    StoreEmpty,

    #[error("User store is corrupt: {0}")]
    CorruptStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("User store was modified by another writer")]
    VersionConflict,

    #[error("User store is busy, try again")]
    ServiceBusy,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a corrupt store error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptStore(msg.into())
    }

    /// Structured kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::DuplicateEmail => ErrorKind::DuplicateEmail,
            Error::InvalidCredentials => ErrorKind::InvalidCredentials,
            Error::UserNotFound => ErrorKind::UserNotFound,
            Error::StoreEmpty => ErrorKind::StoreEmpty,
            Error::CorruptStore(_) => ErrorKind::CorruptStore,
            Error::Io(_) => ErrorKind::Io,
            Error::VersionConflict => ErrorKind::VersionConflict,
            Error::ServiceBusy => ErrorKind::ServiceBusy,
            Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// Short message safe to show to end users.
    ///
    /// Storage and internal failures collapse to a fixed text so that paths
    /// and OS error details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::Io(_) => "Storage error".to_string(),
            Error::CorruptStore(_) => "User store is unreadable".to_string(),
            Error::Other(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Discriminant of [`Error`] as exposed over the request/response contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    DuplicateEmail,
    InvalidCredentials,
    UserNotFound,
    StoreEmpty,
    CorruptStore,
    Io,
    VersionConflict,
    ServiceBusy,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::DuplicateEmail => "duplicate_email",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::UserNotFound => "user_not_found",
            ErrorKind::StoreEmpty => "store_empty",
            ErrorKind::CorruptStore => "corrupt_store",
            ErrorKind::Io => "io",
            ErrorKind::VersionConflict => "version_conflict",
            ErrorKind::ServiceBusy => "service_busy",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ServiceBusy | ErrorKind::VersionConflict)
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Response envelope handed to the calling layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            context: None,
        }
    }

    /// Attach extra context to the envelope
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.kind(), e.public_message()),
        }
    }
}
