//! Cross-process change detection for a [`FileStore`].
//!
//! Another `health` process (or an editor) replacing a slot file shows up
//! here as a `storage` signal, the same way a second browser tab's write
//! shows up as a storage event.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::events::{EventBus, Signal};
use super::kv::{FileStore, KeyValueStore};
use super::CollectionKey;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create data directory {}: {1}", .0.display())]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to watch {}: {1}", .0.display())]
    Notify(PathBuf, #[source] notify::Error),
}

/// Publishes [`Signal::storage`] when a slot changes outside this process.
///
/// Watching stops when the value is dropped.
pub struct StorageWatcher {
    _watcher: RecommendedWatcher,
    data_dir: PathBuf,
}

impl StorageWatcher {
    pub fn start(store: FileStore, bus: EventBus) -> Result<Self, WatchError> {
        let data_dir = store.data_dir().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| WatchError::CreateDir(data_dir.clone(), e))?;

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => Self::process_event(&store, &bus, event),
                Err(e) => tracing::warn!("Storage watcher error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| WatchError::Notify(data_dir.clone(), e))?;

        watcher
            .watch(&data_dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Notify(data_dir.clone(), e))?;

        tracing::debug!("Watching {} for external changes", data_dir.display());

        Ok(Self {
            _watcher: watcher,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    fn process_event(store: &FileStore, bus: &EventBus, event: Event) {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }

        for key in Self::changed_keys(&event) {
            let content = match store.get(key.storage_key()) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to re-read {}: {}", key, e);
                    continue;
                }
            };

            if store.observe(key.storage_key(), content) {
                tracing::debug!("External change to {}", key);
                bus.publish(Signal::storage(key));
            }
        }
    }

    fn changed_keys(event: &Event) -> Vec<CollectionKey> {
        let mut keys = Vec::new();
        for path in &event.paths {
            let key = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(FileStore::key_for_file_name)
                .and_then(CollectionKey::from_storage_key);
            if let Some(key) = key {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}
