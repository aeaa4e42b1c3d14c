//! Validation and persistence of new activity and metric entries.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::{Activity, ActivityType, Metric, MetricType};
use crate::store::{CollectionKey, RecordStore, StoreError};

pub const MAX_DURATION_MINUTES: u32 = 1440;
pub const MAX_NOTES_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found in a draft, in field order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Please fix the following: {}", join_errors(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum EntryError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raw activity input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct ActivityDraft {
    pub date: String,
    pub activity_type: String,
    /// Minutes.
    pub duration: String,
    pub notes: String,
}

impl ActivityDraft {
    /// Checks every field against `today` and builds the record.
    pub fn validate(&self, today: NaiveDate) -> Result<Activity, ValidationErrors> {
        let mut errors = Vec::new();

        let date = check_date(&self.date, today, &mut errors);

        let activity_type = if self.activity_type.trim().is_empty() {
            errors.push(FieldError::new("type", "Please choose an activity type."));
            None
        } else {
            match self.activity_type.parse::<ActivityType>() {
                Ok(t) => Some(t),
                Err(e) => {
                    errors.push(FieldError::new("type", e));
                    None
                }
            }
        };

        let duration = match parse_positive(&self.duration) {
            None => {
                errors.push(FieldError::new(
                    "duration",
                    "Enter duration in minutes (greater than 0).",
                ));
                None
            }
            Some(n) if n.fract() != 0.0 => {
                errors.push(FieldError::new(
                    "duration",
                    "Duration must be a whole number of minutes.",
                ));
                None
            }
            Some(n) if n > f64::from(MAX_DURATION_MINUTES) => {
                errors.push(FieldError::new(
                    "duration",
                    format!("Duration cannot exceed {} minutes.", MAX_DURATION_MINUTES),
                ));
                None
            }
            Some(n) => Some(n as u32),
        };

        let notes = check_notes(&self.notes, &mut errors);

        match (date, activity_type, duration) {
            (Some(date), Some(activity_type), Some(duration)) if errors.is_empty() => {
                Ok(Activity::new(date, activity_type, duration).with_notes(notes))
            }
            _ => Err(ValidationErrors { errors }),
        }
    }
}

/// Raw metric input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct MetricDraft {
    pub date: String,
    pub metric_type: String,
    pub value: String,
    pub notes: String,
}

impl MetricDraft {
    /// Checks every field against `today` and builds the record, deriving
    /// the unit from the type.
    pub fn validate(&self, today: NaiveDate) -> Result<Metric, ValidationErrors> {
        let mut errors = Vec::new();

        let date = check_date(&self.date, today, &mut errors);

        let metric_type = if self.metric_type.trim().is_empty() {
            errors.push(FieldError::new("type", "Please choose a metric type."));
            None
        } else {
            match self.metric_type.parse::<MetricType>() {
                Ok(t) => Some(t),
                Err(e) => {
                    errors.push(FieldError::new("type", e));
                    None
                }
            }
        };

        let value = match (parse_positive(&self.value), &metric_type) {
            (None, _) => {
                errors.push(FieldError::new(
                    "value",
                    "Enter a numeric value (greater than 0).",
                ));
                None
            }
            (Some(n), Some(t)) if t.requires_integer() && n.fract() != 0.0 => {
                errors.push(FieldError::new(
                    "value",
                    format!("{} must be a whole number.", t),
                ));
                None
            }
            (Some(n), Some(t)) if n > t.max_value() => {
                errors.push(FieldError::new(
                    "value",
                    format!("{} cannot exceed {} {}.", t, t.max_value(), t.unit()),
                ));
                None
            }
            (Some(n), _) => Some(n),
        };

        let notes = check_notes(&self.notes, &mut errors);

        match (date, metric_type, value) {
            (Some(date), Some(metric_type), Some(value)) if errors.is_empty() => {
                Ok(Metric::new(date, metric_type, value).with_notes(notes))
            }
            _ => Err(ValidationErrors { errors }),
        }
    }
}

fn check_date(raw: &str, today: NaiveDate, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new("date", "Please select a date."));
        return None;
    }

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) if date > today => {
            errors.push(FieldError::new("date", "Date cannot be in the future."));
            None
        }
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new("date", "Enter the date as YYYY-MM-DD."));
            None
        }
    }
}

/// A finite number greater than zero, or `None`.
fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

fn check_notes(raw: &str, errors: &mut Vec<FieldError>) -> String {
    let notes = raw.trim();
    if notes.chars().count() > MAX_NOTES_CHARS {
        errors.push(FieldError::new(
            "notes",
            format!("Notes must be {} characters or fewer.", MAX_NOTES_CHARS),
        ));
    }
    notes.to_string()
}

/// Validates the draft, prepends the new activity to the collection and
/// raises `activities:updated`. Stored entries are carried over as-is.
pub fn log_activity(
    store: &RecordStore,
    draft: &ActivityDraft,
    today: NaiveDate,
) -> Result<Activity, EntryError> {
    let activity = draft.validate(today)?;

    store.prepend(CollectionKey::Activities, &activity)?;
    store.raise_changed(CollectionKey::Activities);

    tracing::debug!("Logged activity {}", activity.id);
    Ok(activity)
}

/// Validates the draft, prepends the new metric to the collection and
/// raises `metrics:updated`.
pub fn log_metric(
    store: &RecordStore,
    draft: &MetricDraft,
    today: NaiveDate,
) -> Result<Metric, EntryError> {
    let metric = draft.validate(today)?;

    store.prepend(CollectionKey::Metrics, &metric)?;
    store.raise_changed(CollectionKey::Metrics);

    tracing::debug!("Logged metric {}", metric.id);
    Ok(metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Topic};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn activity_draft() -> ActivityDraft {
        ActivityDraft {
            date: "2026-10-18".to_string(),
            activity_type: "Running".to_string(),
            duration: "45".to_string(),
            notes: "  Easy pace  ".to_string(),
        }
    }

    fn metric_draft(metric_type: &str, value: &str) -> MetricDraft {
        MetricDraft {
            date: "2026-10-19".to_string(),
            metric_type: metric_type.to_string(),
            value: value.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_valid_activity_draft() {
        let activity = activity_draft().validate(today()).unwrap();

        assert_eq!(activity.date_iso, "2026-10-18");
        assert_eq!(activity.activity_type, ActivityType::Running);
        assert_eq!(activity.duration, 45);
        assert_eq!(activity.notes, "Easy pace");
    }

    #[test]
    fn test_empty_activity_draft_reports_all_fields() {
        let err = ActivityDraft::default().validate(today()).unwrap_err();

        let fields: Vec<&str> = err.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["date", "type", "duration"]);
        assert_eq!(err.get("date").unwrap().message, "Please select a date.");
        assert_eq!(
            err.get("type").unwrap().message,
            "Please choose an activity type."
        );
    }

    #[test]
    fn test_future_and_malformed_dates() {
        let mut draft = activity_draft();
        draft.date = "2026-10-20".to_string();
        let err = draft.validate(today()).unwrap_err();
        assert_eq!(
            err.get("date").unwrap().message,
            "Date cannot be in the future."
        );

        draft.date = "10/18/2026".to_string();
        let err = draft.validate(today()).unwrap_err();
        assert_eq!(
            err.get("date").unwrap().message,
            "Enter the date as YYYY-MM-DD."
        );

        draft.date = "2026-10-19".to_string();
        assert!(draft.validate(today()).is_ok());
    }

    #[test]
    fn test_unknown_activity_type() {
        let mut draft = activity_draft();
        draft.activity_type = "Skydiving".to_string();

        let err = draft.validate(today()).unwrap_err();

        assert!(err.get("type").unwrap().message.contains("Skydiving"));
    }

    #[test]
    fn test_duration_rules() {
        let mut draft = activity_draft();
        for bad in ["0", "-5", "abc", "", "12.5", "1441"] {
            draft.duration = bad.to_string();
            assert!(
                draft.validate(today()).unwrap_err().get("duration").is_some(),
                "{} should be rejected",
                bad
            );
        }

        draft.duration = "1440".to_string();
        assert_eq!(draft.validate(today()).unwrap().duration, 1440);
    }

    #[test]
    fn test_notes_limit() {
        let mut draft = activity_draft();
        draft.notes = "x".repeat(MAX_NOTES_CHARS + 1);
        assert!(draft.validate(today()).unwrap_err().get("notes").is_some());

        draft.notes = "x".repeat(MAX_NOTES_CHARS);
        assert!(draft.validate(today()).is_ok());
    }

    #[test]
    fn test_metric_draft_derives_unit() {
        let metric = metric_draft("water", "2.5").validate(today()).unwrap();

        assert_eq!(metric.metric_type, MetricType::Water);
        assert_eq!(metric.value, 2.5);
        assert_eq!(metric.unit, "L");
    }

    #[test]
    fn test_metric_limits() {
        assert!(metric_draft("Steps", "8000").validate(today()).is_ok());
        assert!(metric_draft("Steps", "8000.5").validate(today()).is_err());
        assert!(metric_draft("Steps", "100001").validate(today()).is_err());
        assert!(metric_draft("Water", "20").validate(today()).is_ok());
        assert!(metric_draft("Water", "20.1").validate(today()).is_err());
        assert!(metric_draft("Sleep", "7.5").validate(today()).is_ok());
        assert!(metric_draft("Sleep", "25").validate(today()).is_err());
        assert!(metric_draft("Calories", "20001").validate(today()).is_err());

        let err = metric_draft("Water", "0").validate(today()).unwrap_err();
        assert_eq!(
            err.get("value").unwrap().message,
            "Enter a numeric value (greater than 0)."
        );
    }

    #[test]
    fn test_empty_metric_draft_reports_all_fields() {
        let err = MetricDraft::default().validate(today()).unwrap_err();

        let fields: Vec<&str> = err.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["date", "type", "value"]);
        assert!(err.to_string().starts_with("Please fix the following"));
    }

    #[test]
    fn test_log_activity_prepends_and_signals() {
        let store = RecordStore::in_memory();
        let signals = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&signals);
        let _sub = store.bus().subscribe(Topic::ActivitiesUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let first = log_activity(&store, &activity_draft(), today()).unwrap();
        let mut draft = activity_draft();
        draft.activity_type = "Yoga".to_string();
        let second = log_activity(&store, &draft, today()).unwrap();

        let stored = store.activities();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, second.id);
        assert_eq!(stored[1].id, first.id);
        assert_eq!(signals.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_log_metric_rejects_invalid_without_writing() {
        let store = RecordStore::in_memory();
        let signals = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&signals);
        let _sub = store.bus().subscribe(Topic::MetricsUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let err = log_metric(&store, &metric_draft("Steps", "-1"), today()).unwrap_err();

        assert!(matches!(err, EntryError::Invalid(_)));
        assert!(store.metrics().is_empty());
        assert_eq!(signals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_log_metric_persists() {
        let store = RecordStore::in_memory();

        let metric = log_metric(&store, &metric_draft("Sleep", "8"), today()).unwrap();

        assert_eq!(store.metrics(), vec![metric]);
    }

    #[test]
    fn test_log_activity_keeps_entries_it_cannot_decode() {
        let raw = r#"[{"id":"x","type":"Hiking","duration":"45","dateISO":"2026-10-01"},"loose"]"#;
        let store = RecordStore::new(Arc::new(MemoryStore::new().with_raw("activities", raw)));

        let logged = log_activity(&store, &activity_draft(), today()).unwrap();

        let stored = store.activities();
        let ids: Vec<&str> = stored.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![logged.id.as_str(), "x"]);
        assert_eq!(stored[1].activity_type.as_str(), "Hiking");
        assert_eq!(stored[1].duration, 45);

        let again = log_activity(&store, &activity_draft(), today()).unwrap();
        assert_eq!(store.activities().len(), 3);
        assert_eq!(store.activities()[0].id, again.id);
    }

    #[test]
    fn test_log_metric_keeps_unknown_types() {
        let raw = r#"[{"id":"w1","type":"Weight","value":80,"unit":"kg","createdAt":1}]"#;
        let store = RecordStore::new(Arc::new(MemoryStore::new().with_raw("metrics", raw)));

        log_metric(&store, &metric_draft("Water", "1.5"), today()).unwrap();

        let stored = store.metrics();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].id, "w1");
        assert_eq!(stored[1].metric_type.as_str(), "Weight");
        assert_eq!(stored[1].unit, "kg");
    }
}
