//! User domain model

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

/// A persisted user record
///
/// Field names match the on-disk layout: `id, username, email, password, phone`.
/// `password` holds the stored credential (an Argon2 PHC string, or plain
/// text for records written before hashing was introduced).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        credential: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password: credential.into(),
            phone,
        }
    }

    /// Sanitized view of this record
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

/// A user record without its credential
///
/// This is what every account operation returns and what the session
/// client caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        }
    }
}

/// Signup request
#[derive(Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Reject requests missing a required field
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(Error::invalid_input("username is required"));
        }
        if self.email.is_empty() {
            return Err(Error::invalid_input("email is required"));
        }
        if self.password.is_empty() {
            return Err(Error::invalid_input("password is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Partial profile update
///
/// Absent and empty fields both mean "leave unchanged".
#[derive(Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Email to apply, if one was supplied and is non-empty
    pub fn new_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }

    /// Password to apply, if one was supplied and is non-empty
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
