//! Durable cache store backed by a single JSON file.

use super::{CacheEntry, CacheError, CacheKey, CacheStore};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Name of the cache file inside the cache directory.
const CACHE_FILE_NAME: &str = "pages.json";

/// Cache store that survives process restarts.
///
/// All entries live in one JSON object keyed by [`CacheKey`]'s display form.
/// Every write rewrites the file through a temporary file in the same
/// directory, so readers never observe a half-written cache.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl FileStore {
    /// Opens (or creates) the cache in `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory cannot be created or the
    /// existing cache file cannot be read or parsed.
    pub fn open(directory: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(directory).map_err(|e| CacheError::IoError {
            path: directory.display().to_string(),
            source: e,
        })?;

        let path = directory.join(CACHE_FILE_NAME);
        let entries = load_entries(&path)?;
        debug!(path = %path.display(), count = entries.len(), "Opened page cache");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry>) -> Result<(), CacheError> {
        let io_error = |source| CacheError::IoError {
            path: self.path.display().to_string(),
            source,
        };

        let json = serde_json::to_vec(entries).map_err(|e| CacheError::JsonError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(directory).map_err(io_error)?;
        file.write_all(&json).map_err(io_error)?;
        file.persist(&self.path).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, CacheEntry>, CacheError> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(CacheError::IoError {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    serde_json::from_slice(&content).map_err(|e| CacheError::JsonError {
        path: path.display().to_string(),
        source: e,
    })
}

impl CacheStore for FileStore {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().get(&key.to_string()).cloned()
    }

    fn set(&self, key: &CacheKey, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), entry);
        if let Err(e) = self.persist(&entries) {
            warn!(key = %key, error = %e, "Failed to persist page cache");
            return Err(e);
        }
        Ok(())
    }
}
