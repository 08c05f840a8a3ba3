//! Key-value storage backends
//!
//! The request store only needs three operations from its persistence layer,
//! captured by [`StorageBackend`]. [`FileBackend`] keeps one file per key on
//! disk; [`MemoryBackend`] keeps everything in a map and is used in tests.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The underlying medium failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The value does not fit in the space available.
    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        /// Size of the rejected value.
        needed: usize,
        /// Maximum size the backend accepts.
        limit: usize,
    },
}

/// A persistent key-value byte store.
pub trait StorageBackend {
    /// Reads the value stored at `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Deletes the value at `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing value cannot be deleted.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// An in-memory backend, optionally with a size quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Creates an empty backend with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend that rejects values larger than `limit`
    /// bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(limit),
        }
    }

    /// Changes the quota. `None` removes it.
    pub const fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A backend storing each key as a JSON file in a directory.
///
/// The directory is created on the first write.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens a backend rooted at `dir`.
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The directory values are stored in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        tracing::trace!("Writing {} bytes to {}", value.len(), path.display());
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn memory_backend_round_trips_values() {
        let mut backend = MemoryBackend::new();
        assert!(backend.get("key").unwrap().is_none());

        backend.set("key", b"[]").unwrap();
        assert_eq!(backend.get("key").unwrap().as_deref(), Some(&b"[]"[..]));

        backend.remove("key").unwrap();
        assert!(backend.get("key").unwrap().is_none());
    }

    #[test]
    fn memory_backend_enforces_quota() {
        let mut backend = MemoryBackend::with_quota(4);
        backend.set("key", b"1234").unwrap();

        let error = backend.set("key", b"12345").unwrap_err();
        assert!(matches!(
            error,
            StorageError::QuotaExceeded {
                needed: 5,
                limit: 4
            }
        ));
        // The previous value survives a rejected write.
        assert_eq!(backend.get("key").unwrap().as_deref(), Some(&b"1234"[..]));
    }

    #[test]
    fn file_backend_creates_directory_on_write() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("nested").join("storage");
        let mut backend = FileBackend::new(dir.clone());

        assert!(backend.get("key").unwrap().is_none());
        backend.set("key", b"[1]").unwrap();

        assert!(dir.join("key.json").exists());
        assert_eq!(backend.get("key").unwrap().as_deref(), Some(&b"[1]"[..]));
    }

    #[test]
    fn file_backend_remove_missing_key_is_ok() {
        let tmp = tempdir().unwrap();
        let mut backend = FileBackend::new(tmp.path().to_path_buf());
        backend.remove("absent").unwrap();

        backend.set("present", b"x").unwrap();
        backend.remove("present").unwrap();
        assert!(backend.get("present").unwrap().is_none());
    }
}
