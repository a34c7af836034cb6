//! Local key-value storage backends.
//!
//! The journal persists everything as text under a handful of string keys.
//! [`FileStore`] keeps one file per key inside a data directory and replaces
//! files atomically; [`MemoryStore`] keeps the same contract in memory.

use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{debug, error, trace};
use tempfile::NamedTempFile;

use crate::{DiaryError, Result};

/// Text storage addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Shared handle to a storage backend.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Stores each key as a file in `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key to its file, replacing characters that would escape `root`.
    fn key_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                other => other,
            })
            .collect();
        let file_name = if file_name.starts_with('.') {
            format!("_{}", file_name)
        } else {
            file_name
        };
        self.root.join(file_name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        trace!("Reading key {} from {}", key, path.display());
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                Err(DiaryError::StorageError {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        debug!("Writing key {} to {}", key, path.display());

        if !self.root.exists() {
            debug!("Creating data directory: {}", self.root.display());
            fs::create_dir_all(&self.root).map_err(|e| {
                error!("Failed to create directory {}: {}", self.root.display(), e);
                DiaryError::Io(e)
            })?;
        }

        // Write next to the target so the final rename stays on one filesystem.
        let mut temp_file = NamedTempFile::new_in(&self.root).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            DiaryError::Io(e)
        })?;

        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            DiaryError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            DiaryError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            DiaryError::Io(e.error)
        })?;

        trace!("Key {} written", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed key {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DiaryError::Io(e)),
        }
    }
}

/// In-process storage, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_failed(key: &str) -> DiaryError {
        DiaryError::StorageError {
            key: key.to_string(),
            message: "Failed to acquire lock on memory store".to_string(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| Self::lock_failed(key))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_failed(key))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::lock_failed(key))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_reads_back_what_it_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));

        assert_eq!(store.get("diary.theme").unwrap(), None);
        store.set("diary.theme", "dark").unwrap();
        assert_eq!(store.get("diary.theme").unwrap().as_deref(), Some("dark"));

        store.set("diary.theme", "light").unwrap();
        assert_eq!(store.get("diary.theme").unwrap().as_deref(), Some("light"));

        store.remove("diary.theme").unwrap();
        store.remove("diary.theme").unwrap();
        assert_eq!(store.get("diary.theme").unwrap(), None);
    }

    #[test]
    fn file_store_keeps_keys_inside_root() {
        let store = FileStore::new("/tmp/diary-root");
        let path = store.key_path("diary.notes.../../etc/passwd");
        assert_eq!(path.parent(), Some(Path::new("/tmp/diary-root")));

        let hidden = store.key_path("..");
        assert_eq!(hidden.parent(), Some(Path::new("/tmp/diary-root")));
    }

    #[test]
    fn memory_store_is_isolated_per_instance() {
        let a = MemoryStore::new();
        let b = MemoryStore::new();
        a.set("k", "v").unwrap();
        assert_eq!(a.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.get("k").unwrap(), None);
    }
}
