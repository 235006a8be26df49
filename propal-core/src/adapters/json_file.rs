//! JSON file record store
//!
//! Persists the collection as a pretty-printed JSON array in a single file.
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so readers see either the old or the new collection.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::result::{Error, Result};
use crate::domain::{Snapshot, UserRecord};
use crate::lock::{StoreLock, TransactionGuard};
use crate::ports::RecordStore;

/// Default file name inside the data directory
pub const DEFAULT_FILE_NAME: &str = "users.json";

/// File-backed record store
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    lock: StoreLock,
}

impl JsonFileRecordStore {
    /// Open a store at `path`. Nothing is created until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = StoreLock::with_lock_file(lock_path_for(&path));
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// `users.json` -> `users.json.lock`
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
    name.push(".lock");
    path.with_file_name(name)
}

impl RecordStore for JsonFileRecordStore {
    fn load_all(&self) -> Result<Snapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::empty()),
            Err(e) => return Err(e.into()),
        };

        let records: Vec<UserRecord> = serde_json::from_str(&content)
            .map_err(|e| Error::corrupt(format!("{}: {}", self.path.display(), e)))?;

        Ok(Snapshot::persisted(records))
    }

    fn save_all(&self, records: &[UserRecord]) -> Result<()> {
        let dir = self.directory();
        fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(records).map_err(io::Error::other)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".users-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;

        // Rename within one directory is atomic; the temp file is removed on failure
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn begin(&self, wait: Duration) -> Result<TransactionGuard<'_>> {
        self.lock.acquire(wait)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
