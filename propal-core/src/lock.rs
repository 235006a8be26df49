//! Store-scoped transaction lock
//!
//! Serializes load-mutate-save cycles against one record store. Inside a
//! process an ordinary mutex does the work; an optional advisory lock file
//! extends the exclusion to other processes sharing the same data directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use rand::Rng;

use crate::domain::result::{Error, Result};

/// First retry delay in milliseconds (doubles each retry: 5, 10, 20, 40, 80, 100...)
const INITIAL_RETRY_DELAY_MS: u64 = 5;

/// Upper bound for a single retry delay
const MAX_RETRY_DELAY_MS: u64 = 100;

/// Mutual-exclusion boundary for one record store
#[derive(Debug)]
pub struct StoreLock {
    local: Mutex<()>,
    lock_path: Option<PathBuf>,
}

impl StoreLock {
    /// Lock that only excludes other threads of this process
    pub fn in_process() -> Self {
        Self {
            local: Mutex::new(()),
            lock_path: None,
        }
    }

    /// Lock that also takes an exclusive advisory lock on `lock_path`
    pub fn with_lock_file(lock_path: impl Into<PathBuf>) -> Self {
        Self {
            local: Mutex::new(()),
            lock_path: Some(lock_path.into()),
        }
    }

    pub fn lock_path(&self) -> Option<&Path> {
        self.lock_path.as_deref()
    }

    /// Acquire the lock, waiting at most `wait`
    ///
    /// Returns `ServiceBusy` when the deadline passes first.
    pub fn acquire(&self, wait: Duration) -> Result<TransactionGuard<'_>> {
        let deadline = Instant::now() + wait;
        let mut attempt = 0u32;

        let local = loop {
            match self.local.try_lock() {
                Ok(guard) => break guard,
                // The mutex protects no data, so a panic in another holder is harmless
                Err(TryLockError::Poisoned(poisoned)) => break poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => back_off(deadline, &mut attempt)?,
            }
        };

        let file = match &self.lock_path {
            Some(path) => Some(lock_file(path, deadline, &mut attempt)?),
            None => None,
        };

        Ok(TransactionGuard {
            file,
            _local: local,
        })
    }
}

/// Held for the duration of one transaction; releases on drop
#[derive(Debug)]
pub struct TransactionGuard<'a> {
    file: Option<File>,
    _local: MutexGuard<'a, ()>,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

fn lock_file(path: &Path, deadline: Instant, attempt: &mut u32) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    let contended = fs2::lock_contended_error().raw_os_error();
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(file),
            Err(e) if e.raw_os_error() == contended => back_off(deadline, attempt)?,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Sleep before the next attempt, or give up once the deadline has passed
fn back_off(deadline: Instant, attempt: &mut u32) -> Result<()> {
    let now = Instant::now();
    if now >= deadline {
        return Err(Error::ServiceBusy);
    }

    let base = (INITIAL_RETRY_DELAY_MS << (*attempt).min(5)).min(MAX_RETRY_DELAY_MS);
    let jitter = rand::thread_rng().gen_range(0..=base / 2);
    let delay = Duration::from_millis(base + jitter).min(deadline - now);
    *attempt += 1;

    thread::sleep(delay);
    Ok(())
}
