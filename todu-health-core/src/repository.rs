//! Unified read model over the activity and metric collections.

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{Activity, Metric, Record};
use crate::store::{CollectionKey, RecordStore, Subscription, Topic};

/// Source of merged records.
///
/// Every read is a potential suspension point; implementations may be
/// backed by local storage or by something slower.
#[async_trait]
pub trait RecordsRepository: Send + Sync {
    /// All records from both collections, newest `created_at` first.
    async fn get_all(&self) -> Vec<Record>;

    /// First record with a matching id, or `None`.
    async fn get_by_id(&self, id: &str) -> Option<Record> {
        self.get_all().await.into_iter().find(|r| r.id() == id)
    }

    /// Calls `on_change` once per change signal received, until the
    /// returned handle is released.
    fn subscribe(&self, on_change: Box<dyn Fn() + Send + Sync>) -> Subscription;
}

/// Repository over a [`RecordStore`].
///
/// Holds no state of its own; each call re-reads both slots.
#[derive(Clone, Debug)]
pub struct LocalRecordsRepository {
    store: RecordStore,
}

impl LocalRecordsRepository {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    fn merged(&self) -> Vec<Record> {
        let activities: Vec<Activity> = self.store.read_collection(CollectionKey::Activities);
        let metrics: Vec<Metric> = self.store.read_collection(CollectionKey::Metrics);

        let mut records: Vec<Record> = activities
            .into_iter()
            .map(Record::Activity)
            .chain(metrics.into_iter().map(Record::Metric))
            .collect();

        // Stable: equal timestamps keep activities-then-metrics slot order.
        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        records
    }
}

#[async_trait]
impl RecordsRepository for LocalRecordsRepository {
    async fn get_all(&self) -> Vec<Record> {
        self.merged()
    }

    fn subscribe(&self, on_change: Box<dyn Fn() + Send + Sync>) -> Subscription {
        let on_change: Arc<dyn Fn() + Send + Sync> = Arc::from(on_change);
        let bus = self.store.bus();

        [
            Topic::Storage,
            Topic::ActivitiesUpdated,
            Topic::MetricsUpdated,
        ]
        .into_iter()
        .fold(Subscription::empty(), |sub, topic| {
            let on_change = Arc::clone(&on_change);
            sub.merge(bus.subscribe(topic, move |_| on_change()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, MetricType, RecordKind};
    use crate::store::{MemoryStore, Signal};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn activity(id: &str, created_at: i64) -> Activity {
        let mut a = Activity::new(day(), ActivityType::Running, 30).with_created_at(created_at);
        a.id = id.to_string();
        a
    }

    fn metric(id: &str, created_at: i64) -> Metric {
        let mut m = Metric::new(day(), MetricType::Steps, 5000.0).with_created_at(created_at);
        m.id = id.to_string();
        m
    }

    fn seeded(activities: &[Activity], metrics: &[Metric]) -> LocalRecordsRepository {
        let store = RecordStore::in_memory();
        store
            .write_collection(CollectionKey::Activities, activities)
            .unwrap();
        store
            .write_collection(CollectionKey::Metrics, metrics)
            .unwrap();
        LocalRecordsRepository::new(store)
    }

    #[tokio::test]
    async fn test_get_all_merges_and_sorts_newest_first() {
        let repo = seeded(&[activity("a1", 2), activity("a2", 1)], &[metric("m1", 3)]);

        let all = repo.get_all().await;
        let ids: Vec<&str> = all.iter().map(|r| r.id()).collect();

        assert_eq!(ids, vec!["m1", "a1", "a2"]);
        assert_eq!(all[0].kind(), RecordKind::Metric);
        assert_eq!(all[1].kind(), RecordKind::Activity);
        assert_eq!(all[2].kind(), RecordKind::Activity);
    }

    #[tokio::test]
    async fn test_get_all_missing_created_at_sorts_last() {
        let raw = r#"[{"id":"old","type":"Gym","dateISO":"2025-05-01","duration":10}]"#;
        let store = RecordStore::new(Arc::new(MemoryStore::new().with_raw("activities", raw)));
        store
            .write_collection(CollectionKey::Metrics, &[metric("m1", 5)])
            .unwrap();
        let repo = LocalRecordsRepository::new(store);

        let ids: Vec<String> = repo
            .get_all()
            .await
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["m1", "old"]);
    }

    fn raw_repo(activities: &str, metrics: &str) -> LocalRecordsRepository {
        let kv = MemoryStore::new()
            .with_raw("activities", activities)
            .with_raw("metrics", metrics);
        LocalRecordsRepository::new(RecordStore::new(Arc::new(kv)))
    }

    #[tokio::test]
    async fn test_get_all_accepts_minimal_stored_records() {
        let repo = raw_repo(
            r#"[{"id":"a1","createdAt":2},{"id":"a2","createdAt":1}]"#,
            r#"[{"id":"m1","createdAt":3}]"#,
        );

        let all = repo.get_all().await;
        let ids: Vec<&str> = all.iter().map(|r| r.id()).collect();
        let kinds: Vec<RecordKind> = all.iter().map(|r| r.kind()).collect();

        assert_eq!(ids, vec!["m1", "a1", "a2"]);
        assert_eq!(
            kinds,
            vec![RecordKind::Metric, RecordKind::Activity, RecordKind::Activity]
        );
    }

    #[tokio::test]
    async fn test_get_all_keeps_unknown_types_and_string_numbers() {
        let repo = raw_repo(
            r#"[{"id":"r1","type":"Running","duration":30,"createdAt":2},{"id":"h1","type":"Hiking","duration":"45","createdAt":1}]"#,
            "[]",
        );

        let all = repo.get_all().await;

        assert_eq!(all.len(), 2);
        assert_eq!(all[1].type_name(), "Hiking");
        assert_eq!(all[1].as_activity().map(|a| a.duration), Some(45));
    }

    #[tokio::test]
    async fn test_corrupted_activities_leave_metrics_readable() {
        let repo = raw_repo("{not-json", r#"[{"id":"m1","type":"Steps","value":10}]"#);

        let all = repo.get_all().await;

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), "m1");
        assert_eq!(all[0].kind(), RecordKind::Metric);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let repo = seeded(&[activity("a9", 1)], &[metric("m9", 2)]);

        let found = repo.get_by_id("m9").await.unwrap();
        assert_eq!(found.kind(), RecordKind::Metric);
        assert_eq!(found.id(), "m9");

        assert!(repo.get_by_id("zzz").await.is_none());
    }

    #[tokio::test]
    async fn test_get_all_is_a_fresh_read() {
        let repo = seeded(&[], &[]);
        assert!(repo.get_all().await.is_empty());

        repo.store()
            .write_collection(CollectionKey::Activities, &[activity("a1", 1)])
            .unwrap();

        assert_eq!(repo.get_all().await.len(), 1);
    }

    #[test]
    fn test_subscribe_fans_in_and_tears_down() {
        let repo = seeded(&[], &[]);
        let bus = repo.store().bus().clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&calls);

        let sub = repo.subscribe(Box::new(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        }));

        bus.publish(Signal::storage(CollectionKey::Activities));
        bus.publish(Signal::updated(CollectionKey::Activities));
        bus.publish(Signal::updated(CollectionKey::Metrics));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        sub.unsubscribe();

        bus.publish(Signal::storage(CollectionKey::Metrics));
        bus.publish(Signal::updated(CollectionKey::Activities));
        bus.publish(Signal::updated(CollectionKey::Metrics));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
