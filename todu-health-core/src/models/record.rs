use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::activity::Activity;
use super::metric::Metric;

/// Which collection a merged record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Activity,
    Metric,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Activity => write!(f, "activity"),
            RecordKind::Metric => write!(f, "metric"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activity" | "activities" => Ok(RecordKind::Activity),
            "metric" | "metrics" => Ok(RecordKind::Metric),
            _ => Err(format!(
                "Invalid record kind '{}'. Valid options: activity, metric",
                s
            )),
        }
    }
}

/// A record from either collection, tagged with its kind.
///
/// Produced by the repository on every read and never persisted; the
/// `kind` tag only exists in this view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Activity(Activity),
    Metric(Metric),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Activity(_) => RecordKind::Activity,
            Record::Metric(_) => RecordKind::Metric,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Activity(a) => &a.id,
            Record::Metric(m) => &m.id,
        }
    }

    pub fn date_iso(&self) -> &str {
        match self {
            Record::Activity(a) => &a.date_iso,
            Record::Metric(m) => &m.date_iso,
        }
    }

    pub fn notes(&self) -> &str {
        match self {
            Record::Activity(a) => &a.notes,
            Record::Metric(m) => &m.notes,
        }
    }

    pub fn created_at(&self) -> i64 {
        match self {
            Record::Activity(a) => a.created_at,
            Record::Metric(m) => m.created_at,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Record::Activity(a) => a.activity_type.as_str(),
            Record::Metric(m) => m.metric_type.as_str(),
        }
    }

    pub fn entry_date(&self) -> Option<NaiveDate> {
        match self {
            Record::Activity(a) => a.entry_date(),
            Record::Metric(m) => m.entry_date(),
        }
    }

    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            Record::Activity(a) => Some(a),
            Record::Metric(_) => None,
        }
    }

    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            Record::Metric(m) => Some(m),
            Record::Activity(_) => None,
        }
    }
}

impl From<Activity> for Record {
    fn from(activity: Activity) -> Self {
        Record::Activity(activity)
    }
}

impl From<Metric> for Record {
    fn from(metric: Metric) -> Self {
        Record::Metric(metric)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Activity(a) => a.fmt(f),
            Record::Metric(m) => m.fmt(f),
        }
    }
}

/// Picks the calendar day a record belongs to.
///
/// The first non-empty source wins: `dateISO`, then the legacy `date`
/// field, then `createdAt` (epoch ms, read in local time). A source that is
/// present but unparseable yields `None`; later sources are not consulted.
pub(crate) fn resolve_entry_date(
    date_iso: &str,
    date: Option<&str>,
    created_at: i64,
) -> Option<NaiveDate> {
    if !date_iso.is_empty() {
        return parse_calendar_date(date_iso);
    }
    if let Some(date) = date.filter(|d| !d.is_empty()) {
        return parse_calendar_date(date);
    }
    if created_at != 0 {
        return DateTime::from_timestamp_millis(created_at)
            .map(|dt| dt.with_timezone(&Local).date_naive());
    }
    None
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Local).date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, MetricType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_kind_from_str() {
        assert_eq!(
            RecordKind::from_str("activity").unwrap(),
            RecordKind::Activity
        );
        assert_eq!(RecordKind::from_str("Metric").unwrap(), RecordKind::Metric);
        assert!(RecordKind::from_str("note").is_err());
    }

    #[test]
    fn test_record_json_carries_kind() {
        let record: Record = Activity::new(date(2025, 5, 10), ActivityType::Running, 30).into();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["kind"], "activity");
        assert_eq!(value["type"], "Running");
        assert_eq!(value["duration"], 30);
    }

    #[test]
    fn test_record_accessors() {
        let metric = Metric::new(date(2025, 5, 11), MetricType::Water, 2.0)
            .with_notes("Hydrated")
            .with_created_at(42);
        let record = Record::from(metric.clone());

        assert_eq!(record.kind(), RecordKind::Metric);
        assert_eq!(record.id(), metric.id);
        assert_eq!(record.date_iso(), "2025-05-11");
        assert_eq!(record.notes(), "Hydrated");
        assert_eq!(record.created_at(), 42);
        assert_eq!(record.type_name(), "Water");
        assert!(record.as_metric().is_some());
        assert!(record.as_activity().is_none());
    }

    #[test]
    fn test_entry_date_prefers_date_iso() {
        let resolved = resolve_entry_date("2025-05-10", Some("2024-01-01"), 1);
        assert_eq!(resolved, Some(date(2025, 5, 10)));
    }

    #[test]
    fn test_entry_date_falls_back_to_legacy_date() {
        assert_eq!(
            resolve_entry_date("", Some("2024-01-02"), 0),
            Some(date(2024, 1, 2))
        );
    }

    #[test]
    fn test_entry_date_falls_back_to_created_at() {
        let created = date(2025, 3, 14)
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .unwrap()
            .timestamp_millis();
        assert_eq!(resolve_entry_date("", None, created), Some(date(2025, 3, 14)));
    }

    #[test]
    fn test_entry_date_missing_everywhere() {
        assert_eq!(resolve_entry_date("", None, 0), None);
    }

    #[test]
    fn test_entry_date_unparseable_first_source_is_not_skipped() {
        assert_eq!(resolve_entry_date("yesterday", Some("2024-01-02"), 5), None);
    }
}
