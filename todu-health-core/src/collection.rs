//! Live snapshot of a single collection.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::models::{Activity, Metric};
use crate::store::{CollectionKey, RecordStore, Subscription, Topic};

/// Keeps a copy of one collection current.
///
/// Reloads when this process writes the collection, or when a storage
/// signal arrives for its own slot. Signals for the other slot are ignored.
pub struct LiveCollection<T> {
    key: CollectionKey,
    data: Arc<RwLock<Vec<T>>>,
    _subscription: Subscription,
}

impl<T> LiveCollection<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(store: &RecordStore, key: CollectionKey) -> Self {
        let data = Arc::new(RwLock::new(store.read_collection(key)));

        let reload: Arc<dyn Fn() + Send + Sync> = {
            let store = store.clone();
            let data = Arc::downgrade(&data);
            Arc::new(move || {
                if let Some(data) = data.upgrade() {
                    *data.write() = store.read_collection(key);
                }
            })
        };

        let on_update = Arc::clone(&reload);
        let subscription = store
            .bus()
            .subscribe(key.topic(), move |_| on_update())
            .merge(store.bus().subscribe(Topic::Storage, move |signal| {
                if signal.key == Some(key) {
                    reload();
                }
            }));

        Self {
            key,
            data,
            _subscription: subscription,
        }
    }

    pub fn key(&self) -> CollectionKey {
        self.key
    }

    /// Current snapshot.
    pub fn data(&self) -> Vec<T> {
        self.data.read().clone()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Reads are synchronous, so there is never a pending load.
    pub fn is_loading(&self) -> bool {
        false
    }
}

impl LiveCollection<Activity> {
    pub fn activities(store: &RecordStore) -> Self {
        Self::new(store, CollectionKey::Activities)
    }
}

impl LiveCollection<Metric> {
    pub fn metrics(store: &RecordStore) -> Self {
        Self::new(store, CollectionKey::Metrics)
    }
}

impl<T> fmt::Debug for LiveCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveCollection")
            .field("key", &self.key)
            .field("len", &self.data.read().len())
            .finish()
    }
}
