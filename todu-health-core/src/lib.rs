//! Todu Health Core Library
//!
//! Local storage, unified search and trend aggregation for personal
//! activity and health-metric records.

pub mod aggregate;
pub mod collection;
pub mod dashboard;
pub mod forms;
pub mod models;
pub mod repository;
pub mod search;
pub mod store;

pub use aggregate::{
    aggregate_activities, aggregate_activities_at, aggregate_metrics, aggregate_metrics_at,
    bucket_keys, distinct_types, ActivityTrendOptions, ActivityTrendRow, MetricTrendOptions,
    MetricTrendRow, TrendMode, MAX_PERIODS,
};
pub use collection::LiveCollection;
pub use dashboard::DashboardOverview;
pub use forms::{
    log_activity, log_metric, ActivityDraft, EntryError, FieldError, MetricDraft,
    ValidationErrors,
};
pub use models::{Activity, ActivityType, Metric, MetricType, Record, RecordKind};
pub use repository::{LocalRecordsRepository, RecordsRepository};
pub use search::{RecordsSearch, SearchFilters};
pub use store::{
    CollectionKey, EventBus, FileStore, KeyValueStore, MemoryStore, RecordStore, Signal,
    StorageWatcher, StoreError, Subscription, Topic, WatchError,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
