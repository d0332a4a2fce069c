//! Snapshot persistence
//!
//! The store is saved as small JSON blobs under fixed keys. The file
//! backend keeps one `<key>.json` per key in the data directory and
//! uses atomic writes (write to temp file, then rename) to prevent
//! corruption.
//!
//! Storage location: `~/.local/share/quotes/` (configurable via `Config`)
//!
//! Files:
//! - `quotes.json` - Flat array of `{id, text, category, updatedAt}`
//! - `selected_category.json` - The active category filter
//! - `conflicts.json` - Conflicts awaiting resolution

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use super::error::{StorageError, StorageResult};

/// Keys the store persists under
pub mod keys {
    pub const QUOTES: &str = "quotes";
    pub const SELECTED_CATEGORY: &str = "selected_category";
    pub const CONFLICTS: &str = "conflicts";
    /// Where an unreadable quotes snapshot is moved before reseeding
    pub const QUOTES_BACKUP: &str = "quotes.corrupt";
}

/// Durable key/value blob storage
pub trait PersistenceAdapter: Send + Sync {
    /// Store `blob` under `key`, replacing any previous value
    fn save(&self, key: &str, blob: &str) -> StorageResult<()>;

    /// Load the blob stored under `key`, if any
    fn load(&self, key: &str) -> StorageResult<Option<String>>;
}

/// Serialize `value` as JSON and save it under `key`
pub fn save_json<T: Serialize + ?Sized>(
    adapter: &dyn PersistenceAdapter,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let blob = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    adapter.save(key, &blob)
}

/// File-backed persistence, one JSON file per key
#[derive(Debug, Clone)]
pub struct FilePersistence {
    data_dir: PathBuf,
}

impl FilePersistence {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Total size in bytes of the snapshot files present
    pub fn total_size(&self) -> u64 {
        [keys::QUOTES, keys::SELECTED_CATEGORY, keys::CONFLICTS]
            .iter()
            .filter_map(|key| fs::metadata(self.path_for(key)).ok())
            .map(|meta| meta.len())
            .sum()
    }
}

impl PersistenceAdapter for FilePersistence {
    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        atomic_write(&self.path_for(key), blob.as_bytes())
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StorageError::ReadError { path, source })
    }
}

/// In-memory persistence, for tests and ephemeral stores
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob before handing the adapter to a store
    pub fn with_blob(self, key: &str, blob: &str) -> Self {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), blob.to_string());
        self
    }
}

impl PersistenceAdapter for MemoryPersistence {
    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned())
    }
}

impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for std::sync::Arc<T> {
    fn save(&self, key: &str, blob: &str) -> StorageResult<()> {
        (**self).save(key, blob)
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = FilePersistence::new(temp_dir.path());

        assert!(persistence.load(keys::QUOTES).unwrap().is_none());

        persistence.save(keys::QUOTES, "[]").unwrap();
        assert_eq!(persistence.load(keys::QUOTES).unwrap().as_deref(), Some("[]"));
        assert!(persistence.path_for(keys::QUOTES).ends_with("quotes.json"));
    }

    #[test]
    fn test_file_save_overwrites_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = FilePersistence::new(temp_dir.path());

        persistence.save(keys::QUOTES, "[1]").unwrap();
        persistence.save(keys::QUOTES, "[2]").unwrap();

        assert_eq!(persistence.load(keys::QUOTES).unwrap().as_deref(), Some("[2]"));
        assert!(!persistence.path_for(keys::QUOTES).with_extension("tmp").exists());
    }

    #[test]
    fn test_file_creates_missing_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let persistence = FilePersistence::new(&nested);
        assert_eq!(persistence.data_dir(), nested.as_path());

        persistence.save(keys::SELECTED_CATEGORY, "\"all\"").unwrap();
        assert!(nested.join("selected_category.json").exists());
        assert!(persistence.total_size() > 0);
    }

    #[test]
    fn test_memory_persistence() {
        let persistence = MemoryPersistence::new().with_blob(keys::QUOTES, "[]");
        assert_eq!(persistence.load(keys::QUOTES).unwrap().as_deref(), Some("[]"));
        assert!(persistence.load(keys::CONFLICTS).unwrap().is_none());

        persistence.save(keys::CONFLICTS, "[]").unwrap();
        assert!(persistence.load(keys::CONFLICTS).unwrap().is_some());
    }

    #[test]
    fn test_shared_adapter_sees_writes() {
        let shared = Arc::new(MemoryPersistence::new());
        let handle = Arc::clone(&shared);

        save_json(&handle, keys::SELECTED_CATEGORY, "Life").unwrap();
        assert_eq!(
            shared.load(keys::SELECTED_CATEGORY).unwrap().as_deref(),
            Some("\"Life\"")
        );
    }
}
