//! Record store: durable read/write of the raw activity and metric
//! collections, plus the change signals raised around them.
//!
//! # Storage Layout
//!
//! Two independent slots, each a JSON array of plain objects:
//! - `activities`: array of Activity records
//! - `metrics`: array of Metric records
//!
//! A slot that is missing, unreadable or not valid JSON reads as an empty
//! collection. Callers cannot tell "no data yet" from "corrupted data".
//! A valid array is kept whole: elements that do not decode as the record
//! type are skipped on read and left untouched on write.

mod events;
mod kv;
mod watcher;

pub use events::{EventBus, Signal, Subscription, Topic};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use watcher::{StorageWatcher, WatchError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Activity, Metric};

/// Identifies one of the two persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Activities,
    Metrics,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 2] = [CollectionKey::Activities, CollectionKey::Metrics];

    /// Slot name in the key-value store.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKey::Activities => "activities",
            CollectionKey::Metrics => "metrics",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        match key {
            "activities" => Some(CollectionKey::Activities),
            "metrics" => Some(CollectionKey::Metrics),
            _ => None,
        }
    }

    /// Same-process topic raised after this collection is written.
    pub fn topic(&self) -> Topic {
        match self {
            CollectionKey::Activities => Topic::ActivitiesUpdated,
            CollectionKey::Metrics => Topic::MetricsUpdated,
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error for {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode {0}: {1}")]
    Encode(CollectionKey, #[source] serde_json::Error),
}

/// Persistence adapter over the two raw collections.
///
/// Clones share the same backend and event bus.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
    bus: EventBus,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_bus(kv, EventBus::new())
    }

    pub fn with_bus(kv: Arc<dyn KeyValueStore>, bus: EventBus) -> Self {
        Self { kv, bus }
    }

    /// Store backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Reads and decodes a collection.
    ///
    /// Never fails: an absent, unreadable or non-JSON slot yields an empty
    /// vector. Elements of a valid array that cannot be decoded as `T` are
    /// skipped with a warning.
    pub fn read_collection<T: DeserializeOwned>(&self, key: CollectionKey) -> Vec<T> {
        let items = self.read_raw(key);
        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry {} in {}: {}", i, key, e);
                    None
                }
            })
            .collect();
        tracing::debug!("Read {} of {} record(s) from {}", records.len(), total, key);
        records
    }

    /// The slot's JSON array as stored.
    fn read_raw(&self, key: CollectionKey) -> Vec<Value> {
        let raw = match self.kv.get(key.storage_key()) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}, treating as empty: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("{} does not hold a JSON array, treating as empty", key);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Discarding malformed {} collection: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Inserts `record` at the front of the collection and writes it back.
    ///
    /// Existing elements are carried over exactly as stored, including ones
    /// [`RecordStore::read_collection`] cannot decode.
    pub fn prepend<T: Serialize>(&self, key: CollectionKey, record: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(record).map_err(|e| StoreError::Encode(key, e))?;
        let mut items = self.read_raw(key);
        items.insert(0, value);

        let raw = serde_json::to_string(&items).map_err(|e| StoreError::Encode(key, e))?;
        self.kv.set(key.storage_key(), &raw)?;
        tracing::debug!("Wrote {} record(s) to {}", items.len(), key);
        Ok(())
    }

    /// Serializes the full collection and replaces the slot in one write.
    ///
    /// Does not raise a change signal; see [`RecordStore::raise_changed`].
    pub fn write_collection<T: Serialize>(
        &self,
        key: CollectionKey,
        records: &[T],
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records).map_err(|e| StoreError::Encode(key, e))?;
        self.kv.set(key.storage_key(), &raw)?;
        tracing::debug!("Wrote {} record(s) to {}", records.len(), key);
        Ok(())
    }

    /// Publishes the collection's same-process update signal.
    pub fn raise_changed(&self, key: CollectionKey) {
        self.bus.publish(Signal::updated(key));
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.read_collection(CollectionKey::Activities)
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.read_collection(CollectionKey::Metrics)
    }
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, MetricType};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn store_with(key: &str, raw: &str) -> RecordStore {
        RecordStore::new(Arc::new(MemoryStore::new().with_raw(key, raw)))
    }

    #[test]
    fn test_absent_slot_reads_empty() {
        let store = RecordStore::in_memory();
        assert!(store.activities().is_empty());
        assert!(store.metrics().is_empty());
    }

    #[test]
    fn test_malformed_slot_reads_empty() {
        let store = store_with("activities", "{not-json");
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_valid_array_keeps_every_record() {
        let raw = r#"[{"id":"m1","type":"Steps","value":10,"dateISO":"2025-05-10"},{"id":"m2","type":"Weight","value":"80"},{"id":"m3","createdAt":1}]"#;
        let store = store_with("metrics", raw);

        let metrics = store.metrics();

        let ids: Vec<&str> = metrics.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(metrics[1].metric_type.as_str(), "Weight");
        assert_eq!(metrics[1].value, 80.0);
    }

    #[test]
    fn test_non_object_elements_are_skipped() {
        let store = store_with("activities", r#"[42,{"id":"a1","type":"Yoga"},"x"]"#);

        let activities = store.activities();

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, "a1");
    }

    #[test]
    fn test_non_array_json_reads_empty() {
        let store = store_with("activities", r#"{"id":"a1"}"#);
        assert!(store.activities().is_empty());
    }

    #[test]
    fn test_prepend_leaves_stored_elements_untouched() {
        let raw = r#"[{"id":"x","type":"Hiking","duration":"45","extra":true},7]"#;
        let store = store_with("activities", raw);
        let activity = Activity::new(day(), ActivityType::Running, 30);

        store.prepend(CollectionKey::Activities, &activity).unwrap();

        let raw = store.kv.get("activities").unwrap().unwrap();
        let stored: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0]["id"], activity.id.as_str());
        assert_eq!(
            stored[1],
            serde_json::json!({"id":"x","type":"Hiking","duration":"45","extra":true})
        );
        assert_eq!(stored[2], serde_json::json!(7));
    }

    #[test]
    fn test_prepend_into_malformed_slot_starts_fresh() {
        let store = store_with("metrics", "{not-json");
        let metric = Metric::new(day(), MetricType::Sleep, 7.0);

        store.prepend(CollectionKey::Metrics, &metric).unwrap();

        assert_eq!(store.metrics(), vec![metric]);
    }

    #[test]
    fn test_empty_string_slot_reads_empty() {
        let store = store_with("metrics", "");
        assert!(store.metrics().is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let store = RecordStore::in_memory();
        let activity = Activity::new(day(), ActivityType::Running, 30);
        store
            .write_collection(CollectionKey::Activities, std::slice::from_ref(&activity))
            .unwrap();

        assert_eq!(store.activities(), vec![activity]);
        assert!(store.metrics().is_empty());
    }

    #[test]
    fn test_write_replaces_previous_value() {
        let store = RecordStore::in_memory();
        let first = Metric::new(day(), MetricType::Steps, 1000.0);
        let second = Metric::new(day(), MetricType::Water, 1.5);

        store
            .write_collection(CollectionKey::Metrics, &[first])
            .unwrap();
        store
            .write_collection(CollectionKey::Metrics, std::slice::from_ref(&second))
            .unwrap();

        assert_eq!(store.metrics(), vec![second]);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let temp_dir = TempDir::new().unwrap();
        let kv = Arc::new(FileStore::new(temp_dir.path().to_path_buf()));
        let activity = Activity::new(day(), ActivityType::Gym, 60);

        RecordStore::new(kv.clone())
            .write_collection(CollectionKey::Activities, std::slice::from_ref(&activity))
            .unwrap();

        let reopened = RecordStore::new(kv);
        assert_eq!(reopened.activities(), vec![activity]);
    }

    #[test]
    fn test_raise_changed_publishes_collection_topic() {
        let store = RecordStore::in_memory();
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        let _sub = store.bus().subscribe(Topic::MetricsUpdated, move |_| {
            handle.fetch_add(1, Ordering::SeqCst);
        });

        store.raise_changed(CollectionKey::Metrics);
        store.raise_changed(CollectionKey::Activities);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collection_keys() {
        assert_eq!(CollectionKey::Activities.storage_key(), "activities");
        assert_eq!(
            CollectionKey::from_storage_key("metrics"),
            Some(CollectionKey::Metrics)
        );
        assert_eq!(CollectionKey::from_storage_key("notes"), None);
        assert_eq!(CollectionKey::Metrics.topic(), Topic::MetricsUpdated);
    }
}
