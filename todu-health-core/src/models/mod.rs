mod activity;
mod activity_type;
mod lenient;
mod metric;
mod metric_type;
mod record;

pub use activity::Activity;
pub use activity_type::ActivityType;
pub use metric::Metric;
pub use metric_type::MetricType;
pub use record::{Record, RecordKind};
