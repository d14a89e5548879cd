//! Session store abstraction.
//!
//! The session manager and redirect state store persist small JSON
//! documents through this trait. The in-memory implementation backs unit
//! tests; the file-backed implementation survives a process restart, which
//! is this crate's analog of browser storage surviving a full page reload.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Errors produced by the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

/// A keyed store of JSON documents.
///
/// Implementations must be safe for shared use; all operations are
/// synchronous because the client side is single-threaded/cooperative.
pub trait SessionStore: Send + Sync {
    /// Read a document, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a document, replacing any existing value.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a document; removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// File-Backed Store
// =============================================================================

/// File-backed store: one JSON document per store, written through on every
/// mutation. Reopening the same path sees the previous contents, so pending
/// login state survives a restart.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open a store at the given path, loading existing contents if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("lock poisoned".to_string()))?;
        entries.remove(key);
        self.persist(&entries)
    }
}

// =============================================================================
// Tests
// =============================================================================
