//! In-process change notification.
//!
//! Signals carry no data beyond their topic (and, for storage signals, the
//! slot that changed). Subscribers re-read whatever they need.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use super::CollectionKey;

/// Channel a signal is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A slot was replaced by another process.
    Storage,
    /// This process wrote the activities collection.
    ActivitiesUpdated,
    /// This process wrote the metrics collection.
    MetricsUpdated,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::Storage => "storage",
            Topic::ActivitiesUpdated => "activities:updated",
            Topic::MetricsUpdated => "metrics:updated",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub topic: Topic,
    /// Slot that changed; only set for storage signals.
    pub key: Option<CollectionKey>,
}

impl Signal {
    pub fn storage(key: CollectionKey) -> Self {
        Self {
            topic: Topic::Storage,
            key: Some(key),
        }
    }

    pub fn updated(key: CollectionKey) -> Self {
        Self {
            topic: key.topic(),
            key: None,
        }
    }
}

type Callback = Arc<dyn Fn(&Signal) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, Callback)>>,
}

/// Topic-keyed callback registry.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `topic` until the returned handle is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> Subscription
    where
        F: Fn(&Signal) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .handlers
            .entry(topic)
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            entries: vec![(Arc::downgrade(&self.inner), topic, id)],
        }
    }

    /// Invokes every callback registered for the signal's topic, in
    /// registration order, and returns how many ran.
    ///
    /// The registry lock is released before any callback runs.
    pub fn publish(&self, signal: Signal) -> usize {
        let callbacks: Vec<Callback> = {
            let registry = self.inner.lock();
            registry
                .handlers
                .get(&signal.topic)
                .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };

        tracing::debug!(
            "Publishing {} to {} subscriber(s)",
            signal.topic,
            callbacks.len()
        );

        for callback in &callbacks {
            callback(&signal);
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .lock()
            .handlers
            .get(&topic)
            .map_or(0, |list| list.len())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.lock();
        let counts: HashMap<&'static str, usize> = registry
            .handlers
            .iter()
            .map(|(topic, list)| (topic.name(), list.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

/// Handle for one or more registrations.
///
/// Dropping it unsubscribes, same as calling [`Subscription::unsubscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    entries: Vec<(Weak<Mutex<Registry>>, Topic, u64)>,
}

impl Subscription {
    /// A handle with no registrations.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Folds `other`'s registrations into this handle.
    pub fn merge(mut self, mut other: Subscription) -> Self {
        self.entries.append(&mut other.entries);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        for (registry, topic, id) in self.entries.drain(..) {
            let Some(registry) = registry.upgrade() else {
                continue;
            };
            let mut registry = registry.lock();
            if let Some(list) = registry.handlers.get_mut(&topic) {
                list.retain(|(entry_id, _)| *entry_id != id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("registrations", &self.entries.len())
            .finish()
    }
}
