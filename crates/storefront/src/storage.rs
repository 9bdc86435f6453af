//! File-backed key-value persistence for the cart and bearer token.
//!
//! Both values are best-effort: a corrupt or missing file reads back as
//! absent and never fails startup. Writes go through a temp file and rename
//! so a crash mid-write cannot corrupt the previous value.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the persistence layer.
///
/// Only writes surface errors; reads are best-effort and return `None`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A small persistent key-value store rooted at a directory.
///
/// Each key maps to one file under the root. Cloning is cheap; clones share
/// the same root directory.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Open (creating if necessary) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Read the value for `key`, or `None` if missing or unreadable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(key, error = %e, "failed to read persisted value");
                None
            }
        }
    }

    /// Write the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be written or renamed into
    /// place.
    pub fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remove the value for `key`, ignoring a missing file.
    pub fn remove(&self, key: &str) {
        if let Err(e) = fs::remove_file(self.path(key))
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::debug!(key, error = %e, "failed to remove persisted value");
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        Path::new(&self.dir).join(key)
    }
}
