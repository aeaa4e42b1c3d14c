use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::lenient;
use super::metric_type::MetricType;
use super::record::resolve_entry_date;

/// A single health measurement (steps, water, sleep, calories).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "dateISO", default, deserialize_with = "lenient::text")]
    pub date_iso: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(rename = "type", default)]
    pub metric_type: MetricType,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::millis")]
    pub created_at: i64,
}

impl Metric {
    pub fn new(date: NaiveDate, metric_type: MetricType, value: f64) -> Self {
        let unit = metric_type.unit().to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            date_iso: date.format("%Y-%m-%d").to_string(),
            date: None,
            metric_type,
            value,
            unit,
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

    pub fn entry_date(&self) -> Option<NaiveDate> {
        resolve_entry_date(&self.date_iso, self.date.as_deref(), self.created_at)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Metric: {} - {}", self.date_iso, self.metric_type)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "Value: {} {}", self.value, self.unit)?;

        if !self.notes.is_empty() {
            writeln!(f, "\nNotes: {}", self.notes)?;
        }

        Ok(())
    }
}
