//! Account service - signup, login and profile editing
//!
//! Every operation that writes runs as one transaction against the record
//! store: take the store lock, load the collection, mutate it in memory and
//! save it once. Either the whole change is persisted or nothing is.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{NewAccount, ProfileUpdate, Snapshot, UserProfile, UserRecord};
use crate::ports::RecordStore;

use super::credentials::{is_hashed, CredentialHasher, Verification};
use super::logging::{LogEvent, LoggingService};

/// What a transaction body decided to do with the loaded collection
enum Outcome<T> {
    /// Persist the mutated collection, then return the value
    Write(T),
    /// Nothing changed
    Read(T),
}

/// Account operations on top of a record store
pub struct AccountService {
    store: Arc<dyn RecordStore>,
    hasher: CredentialHasher,
    lock_timeout: Duration,
    enforce_unique_email_on_update: bool,
    upgrade_legacy_passwords: bool,
    logger: Option<Arc<LoggingService>>,
}

impl AccountService {
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Result<Self> {
        Ok(Self {
            store,
            hasher: CredentialHasher::new(&config.password_hashing)?,
            lock_timeout: config.lock_timeout,
            enforce_unique_email_on_update: config.enforce_unique_email_on_update,
            upgrade_legacy_passwords: config.upgrade_legacy_passwords,
            logger: None,
        })
    }

    /// Record account events in the given log
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Register a new user
    ///
    /// Fails with `DuplicateEmail` if any record already uses the email; the
    /// store is left untouched in that case.
    pub fn create(&self, account: NewAccount) -> Result<UserProfile> {
        let result = self.create_inner(account);
        match &result {
            Ok(profile) => self.log(LogEvent::new("account_created").with_record(profile.id)),
            Err(e) => self.log_failure("account_create_rejected", e, None),
        }
        result
    }

    fn create_inner(&self, account: NewAccount) -> Result<UserProfile> {
        account.validate()?;

        // Hashing is slow; keep it outside the critical section
        let credential = self.hasher.hash(&account.password)?;

        self.transact(move |snapshot| {
            if snapshot.email_in_use(&account.email, None) {
                return Err(Error::DuplicateEmail);
            }

            let mut record =
                UserRecord::new(account.username, account.email, credential, account.phone);
            while snapshot.contains_id(record.id) {
                record.id = Uuid::new_v4();
            }

            let profile = record.profile();
            snapshot.records.push(record);
            Ok(Outcome::Write(profile))
        })
    }

    /// Check an email/password pair
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<UserProfile> {
        let result = self.authenticate_inner(email, password);
        match &result {
            Ok(profile) => self.log(LogEvent::new("login_succeeded").with_record(profile.id)),
            Err(e) => self.log_failure("login_failed", e, None),
        }
        result
    }

    fn authenticate_inner(&self, email: &str, password: &str) -> Result<UserProfile> {
        // Saves are atomic renames, so a lock-free read sees a whole collection
        let snapshot = self.store.load_all()?;
        snapshot.require_persisted()?;

        let found = snapshot
            .with_email(email)
            .map(|record| (record, self.hasher.verify(password, &record.password)))
            .find(|(_, verification)| verification.is_match());

        let Some((record, verification)) = found else {
            // An unknown email must cost as much as a wrong password
            if !snapshot.with_email(email).any(|r| is_hashed(&r.password)) {
                self.hasher.verify_decoy(password);
            }
            return Err(Error::InvalidCredentials);
        };

        if verification == Verification::LegacyMatch && self.upgrade_legacy_passwords {
            self.upgrade_legacy_credential(record, password);
        }

        Ok(record.profile())
    }

    /// Replace a plain-text credential with a hash after a successful login
    ///
    /// Best effort: the login has already succeeded, so a failure here is
    /// logged and otherwise ignored.
    fn upgrade_legacy_credential(&self, record: &UserRecord, password: &str) {
        let id = record.id;
        let legacy = record.password.clone();

        let result = self.hasher.hash(password).and_then(|credential| {
            self.transact(move |snapshot| {
                // Only if nobody changed the credential since we read it
                match snapshot.records.iter_mut().find(|r| r.id == id) {
                    Some(current) if current.password == legacy => {
                        current.password = credential;
                        Ok(Outcome::Write(()))
                    }
                    _ => Ok(Outcome::Read(())),
                }
            })
        });

        match result {
            Ok(()) => self.log(LogEvent::new("legacy_password_upgraded").with_record(id)),
            Err(e) => self.log_failure("legacy_password_upgrade_failed", &e, Some(id)),
        }
    }

    /// Apply a partial update to the user's email and/or password
    ///
    /// Omitted or empty fields keep their stored value.
    pub fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<UserProfile> {
        let result = self.update_profile_inner(id, update);
        match &result {
            Ok(profile) => self.log(LogEvent::new("profile_updated").with_record(profile.id)),
            Err(e) => self.log_failure("profile_update_rejected", e, Some(id)),
        }
        result
    }

    fn update_profile_inner(&self, id: Uuid, update: ProfileUpdate) -> Result<UserProfile> {
        let new_email = update.new_email().map(str::to_string);
        let new_credential = match update.new_password() {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };
        let enforce_unique = self.enforce_unique_email_on_update;

        self.transact(move |snapshot| {
            snapshot.require_persisted()?;
            let index = snapshot.position_of(id).ok_or(Error::UserNotFound)?;

            if let Some(email) = &new_email {
                if enforce_unique && snapshot.email_in_use(email, Some(id)) {
                    return Err(Error::DuplicateEmail);
                }
            }

            let record = &mut snapshot.records[index];
            let changed = new_email.is_some() || new_credential.is_some();
            if let Some(email) = new_email {
                record.email = email;
            }
            if let Some(credential) = new_credential {
                record.password = credential;
            }

            let profile = record.profile();
            Ok(if changed {
                Outcome::Write(profile)
            } else {
                Outcome::Read(profile)
            })
        })
    }

    /// Run one load-mutate-save cycle under the store lock
    fn transact<T>(&self, body: impl FnOnce(&mut Snapshot) -> Result<Outcome<T>>) -> Result<T> {
        let _guard = match self.store.begin(self.lock_timeout) {
            Ok(guard) => guard,
            Err(e) => {
                if matches!(e, Error::ServiceBusy) {
                    self.log_failure("store_busy", &e, None);
                }
                return Err(e);
            }
        };

        let mut snapshot = self.store.load_all()?;
        match body(&mut snapshot)? {
            Outcome::Write(value) => {
                self.store.save_all(&snapshot.records)?;
                Ok(value)
            }
            Outcome::Read(value) => Ok(value),
        }
    }

    /// Log an event, ignoring any errors (logging should never break an operation)
    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }

    fn log_failure(&self, event: &str, error: &Error, id: Option<Uuid>) {
        // The public message carries no paths or parser output
        let mut event = LogEvent::new(event).with_error(error.kind(), error.public_message());
        if let Some(id) = id {
            event = event.with_record(id);
        }
        self.log(event);
    }
}
