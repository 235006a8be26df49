//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "store": { "fileName": "users.json" },
//!   "lockTimeoutMs": 2000,
//!   "passwordHashing": { "memoryCost": 19456, "timeCost": 2, "parallelism": 1 },
//!   "enforceUniqueEmailOnUpdate": true,
//!   "upgradeLegacyPasswords": true
//! }
//! ```
//! Every field is optional. Fields this crate does not manage are kept when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::json_file::DEFAULT_FILE_NAME;

/// Default wait for the store lock before reporting busy
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

/// Default Argon2id parameters (OWASP minimum for Argon2id)
pub const DEFAULT_MEMORY_COST: u32 = 19456; // 19 MiB
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store: Option<StoreSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lock_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_hashing: Option<PasswordHashing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enforce_unique_email_on_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    upgrade_legacy_passwords: Option<bool>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSettings {
    #[serde(default)]
    file_name: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Argon2id cost parameters for stored credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHashing {
    /// Memory in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            memory_cost: DEFAULT_MEMORY_COST,
            time_cost: DEFAULT_TIME_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// Propal configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub store_file: String,
    pub lock_timeout: Duration,
    pub password_hashing: PasswordHashing,
    pub enforce_unique_email_on_update: bool,
    pub upgrade_legacy_passwords: bool,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_file: DEFAULT_FILE_NAME.to_string(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            password_hashing: PasswordHashing::default(),
            enforce_unique_email_on_update: true,
            upgrade_legacy_passwords: true,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// The lock timeout can be overridden with PROPAL_LOCK_TIMEOUT_MS.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let lock_timeout_ms = match std::env::var("PROPAL_LOCK_TIMEOUT_MS").ok() {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("PROPAL_LOCK_TIMEOUT_MS is not a number: {}", value))?,
            None => raw.lock_timeout_ms.unwrap_or(DEFAULT_LOCK_TIMEOUT_MS),
        };

        let defaults = Config::default();
        Ok(Self {
            store_file: raw
                .store
                .as_ref()
                .and_then(|s| s.file_name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or(defaults.store_file),
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            password_hashing: raw.password_hashing.unwrap_or_default(),
            enforce_unique_email_on_update: raw
                .enforce_unique_email_on_update
                .unwrap_or(defaults.enforce_unique_email_on_update),
            upgrade_legacy_passwords: raw
                .upgrade_legacy_passwords
                .unwrap_or(defaults.upgrade_legacy_passwords),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = self._raw_settings.clone();
        let mut store = settings.store.take().unwrap_or_default();
        store.file_name = Some(self.store_file.clone());
        settings.store = Some(store);
        settings.lock_timeout_ms = Some(self.lock_timeout.as_millis() as u64);
        settings.password_hashing = Some(self.password_hashing);
        settings.enforce_unique_email_on_update = Some(self.enforce_unique_email_on_update);
        settings.upgrade_legacy_passwords = Some(self.upgrade_legacy_passwords);

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Path of the record store file
    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store_file)
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_password_hashing(mut self, hashing: PasswordHashing) -> Self {
        self.password_hashing = hashing;
        self
    }

    pub fn with_unique_email_on_update(mut self, enforce: bool) -> Self {
        self.enforce_unique_email_on_update = enforce;
        self
    }

    pub fn with_legacy_password_upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade_legacy_passwords = upgrade;
        self
    }
}
