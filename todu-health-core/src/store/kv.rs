//! Key-value backends for the record store.
//!
//! Each slot holds one JSON document. Writes replace the whole value.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::StoreError;

/// File extension for collection slots.
const SLOT_EXTENSION: &str = "json";

/// Durable string slots addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the slot has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the slot's value in a single write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Stores each slot as `<key>.json` inside a data directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written slot.
#[derive(Clone, Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    /// Last content this process knows each slot to hold.
    known: Arc<Mutex<HashMap<String, Option<String>>>>,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            known: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the full path for a slot.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", key, SLOT_EXTENSION))
    }

    /// Maps a file name back to its slot key, if it is a slot file.
    pub fn key_for_file_name(file_name: &str) -> Option<&str> {
        file_name
            .strip_suffix(SLOT_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
    }

    /// Records `content` as the slot's current value.
    ///
    /// Returns false when it matches what this process already knew, which
    /// is how the watcher tells its own writes apart from foreign ones.
    pub(crate) fn observe(&self, key: &str, content: Option<String>) -> bool {
        let mut known = self.known.lock();
        if known.get(key) == Some(&content) {
            return false;
        }
        known.insert(key.to_string(), content);
        true
    }

    /// Replaces the known content for `key`, returning what was there.
    fn remember(&self, key: &str, content: Option<Option<String>>) -> Option<Option<String>> {
        let mut known = self.known.lock();
        match content {
            Some(content) => known.insert(key.to_string(), content),
            None => known.remove(key),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path(key);

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|e| StoreError::Io(tmp_path.clone(), e))?;

        // Mark before the rename lands so the watcher sees a known value,
        // and take the mark back if the slot never changes.
        let previous = self.remember(key, Some(Some(value.to_string())));
        if let Err(e) = fs::rename(&tmp_path, &path) {
            self.remember(key, previous);
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                tracing::debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(StoreError::Io(path, e));
        }

        Ok(())
    }
}

/// Process-local slots, used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a slot with raw content, bypassing any encoding.
    pub fn with_raw(self, key: &str, raw: impl Into<String>) -> Self {
        self.slots.lock().insert(key.to_string(), raw.into());
        self
    }

    /// Drops every slot, like clearing browser storage.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_file_store_path() {
        let (store, _temp) = test_store();
        assert!(store.path("activities").ends_with("activities.json"));
    }

    #[test]
    fn test_file_store_missing_slot_is_none() {
        let (store, _temp) = test_store();
        assert!(store.get("metrics").unwrap().is_none());
    }

    #[test]
    fn test_file_store_set_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let store = FileStore::new(nested.clone());

        store.set("activities", "[]").unwrap();

        assert!(nested.join("activities.json").exists());
        assert!(!nested.join("activities.json.tmp").exists());
    }

    #[test]
    fn test_file_store_overwrites_whole_value() {
        let (store, _temp) = test_store();

        store.set("metrics", "[1,2,3]").unwrap();
        store.set("metrics", "[4]").unwrap();

        assert_eq!(store.get("metrics").unwrap().as_deref(), Some("[4]"));
    }

    #[test]
    fn test_observe_suppresses_own_writes() {
        let (store, _temp) = test_store();
        store.set("activities", "[]").unwrap();

        assert!(!store.observe("activities", Some("[]".to_string())));
        assert!(store.observe("activities", Some("[{}]".to_string())));
        assert!(store.observe("activities", None));
    }

    #[test]
    fn test_failed_write_does_not_claim_content() {
        let (store, temp) = test_store();

        // A non-empty directory where the slot file belongs makes the rename fail.
        let blocked = temp.path().join("activities.json");
        fs::create_dir_all(blocked.join("inner")).unwrap();
        assert!(store.set("activities", "[2]").is_err());

        assert!(store.observe("activities", Some("[2]".to_string())));
        assert!(!temp.path().join("activities.json.tmp").exists());
    }

    #[test]
    fn test_failed_rewrite_restores_previous_content() {
        let (store, temp) = test_store();
        store.set("activities", "[1]").unwrap();
        fs::remove_file(store.path("activities")).unwrap();
        fs::create_dir_all(temp.path().join("activities.json").join("inner")).unwrap();

        assert!(store.set("activities", "[2]").is_err());

        assert!(!store.observe("activities", Some("[1]".to_string())));
    }

    #[test]
    fn test_key_for_file_name() {
        assert_eq!(FileStore::key_for_file_name("metrics.json"), Some("metrics"));
        assert_eq!(FileStore::key_for_file_name("metrics.json.tmp"), None);
        assert_eq!(FileStore::key_for_file_name("notes.txt"), None);
    }

    #[test]
    fn test_memory_store_roundtrip_and_clear() {
        let store = MemoryStore::new().with_raw("activities", "[]");
        assert_eq!(store.get("activities").unwrap().as_deref(), Some("[]"));

        store.set("metrics", "[]").unwrap();
        store.clear();

        assert!(store.get("activities").unwrap().is_none());
        assert!(store.get("metrics").unwrap().is_none());
    }
}
