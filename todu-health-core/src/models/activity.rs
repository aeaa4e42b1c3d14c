use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::activity_type::ActivityType;
use super::lenient;
use super::record::resolve_entry_date;

/// A logged workout session. Immutable once written.
///
/// Decoding accepts whatever a stored element holds: missing or unusable
/// fields take their empty value instead of rejecting the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    /// Calendar day the user picked (YYYY-MM-DD); may differ from `created_at`.
    #[serde(rename = "dateISO", default, deserialize_with = "lenient::text")]
    pub date_iso: String,
    /// Legacy date field, only consulted when `dateISO` is empty.
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub duration: u32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    /// Epoch milliseconds.
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::millis")]
    pub created_at: i64,
}

impl Activity {
    pub fn new(date: NaiveDate, activity_type: ActivityType, duration: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date_iso: date.format("%Y-%m-%d").to_string(),
            date: None,
            activity_type,
            duration,
            notes: String::new(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Day the session counts towards, see [`resolve_entry_date`].
    pub fn entry_date(&self) -> Option<NaiveDate> {
        resolve_entry_date(&self.date_iso, self.date.as_deref(), self.created_at)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Activity: {} - {}", self.date_iso, self.activity_type)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "Duration: {} min", self.duration)?;

        if !self.notes.is_empty() {
            writeln!(f, "\nNotes: {}", self.notes)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_new() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let activity = Activity::new(date, ActivityType::Running, 45);

        assert_eq!(activity.date_iso, "2025-05-10");
        assert_eq!(activity.activity_type, ActivityType::Running);
        assert_eq!(activity.duration, 45);
        assert!(activity.notes.is_empty());
        assert!(!activity.id.is_empty());
        assert!(activity.created_at > 0);
    }

    #[test]
    fn test_activity_ids_are_unique() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let a = Activity::new(date, ActivityType::Gym, 30);
        let b = Activity::new(date, ActivityType::Gym, 30);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_activity_display() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let activity = Activity::new(date, ActivityType::Yoga, 20).with_notes("Stretching");

        let output = format!("{}", activity);
        assert!(output.contains("2025-05-10"));
        assert!(output.contains("Yoga"));
        assert!(output.contains("20 min"));
        assert!(output.contains("Stretching"));
    }

    #[test]
    fn test_activity_parses_stored_shape() {
        let json = r#"{"id":"a1","dateISO":"2025-05-10","type":"Running","duration":45,"notes":"Morning jog","createdAt":1715300000000}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();

        assert_eq!(activity.id, "a1");
        assert_eq!(activity.date_iso, "2025-05-10");
        assert_eq!(activity.activity_type, ActivityType::Running);
        assert_eq!(activity.duration, 45);
        assert_eq!(activity.notes, "Morning jog");
        assert_eq!(activity.created_at, 1_715_300_000_000);
    }

    #[test]
    fn test_activity_missing_optional_fields_default() {
        let json = r#"{"id":"a2","type":"Cycling","dateISO":"2025-05-12"}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();

        assert_eq!(activity.duration, 0);
        assert_eq!(activity.notes, "");
        assert_eq!(activity.created_at, 0);
    }

    #[test]
    fn test_activity_serializes_stored_field_names() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let activity = Activity::new(date, ActivityType::Walking, 15);
        let value = serde_json::to_value(&activity).unwrap();

        assert_eq!(value["dateISO"], "2025-05-10");
        assert_eq!(value["type"], "Walking");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("date").is_none());
    }

    #[test]
    fn test_activity_without_type_decodes() {
        let activity: Activity = serde_json::from_str(r#"{"id":"a1","createdAt":2}"#).unwrap();

        assert_eq!(activity.id, "a1");
        assert_eq!(activity.created_at, 2);
        assert_eq!(activity.activity_type, ActivityType::default());
        assert_eq!(activity.activity_type.as_str(), "");
    }

    #[test]
    fn test_activity_unknown_type_and_string_duration() {
        let json = r#"{"id":"h1","type":"Hiking","duration":"45","dateISO":"2025-05-10","notes":null}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();

        assert_eq!(activity.activity_type.as_str(), "Hiking");
        assert_eq!(activity.duration, 45);
        assert_eq!(activity.notes, "");
        assert_eq!(serde_json::to_value(&activity).unwrap()["type"], "Hiking");
    }
}
