// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Key-value string storage backing admission histories.
//!
//! Two backends:
//! - [`MemoryStorage`]: process-local map, used by tests and ephemeral sessions
//! - [`FileStorage`]: a single JSON object on disk that survives restarts

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage errors. The limiter treats every one of these as "no history".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;

/// Minimal string store, modelled on browser local storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed storage: every key lives in one JSON object.
///
/// Writes go to a per-process sibling temp file which is then renamed over
/// the target. `set` does blocking file I/O; async callers should run it
/// on a blocking thread.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged and
    /// also starts empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => {
                debug!(path = %path.display(), keys = entries.len(), "Loaded history store");
                entries
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "History store unreadable, starting empty");
                HashMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "history".to_string());
        self.path
            .with_file_name(format!("{}.{}.tmp", name, std::process::id()))
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, serde_json::to_vec(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(err) => Err(err.into()),
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}
