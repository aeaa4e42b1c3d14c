//! Time-bucketed trend aggregation.
//!
//! Records are grouped into the last `periods` ISO weeks or calendar months
//! (oldest first, ending with the period containing `today`). Records whose
//! entry date falls outside that window, or cannot be determined, are left
//! out without error.

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{Activity, ActivityType, Metric, MetricType};

/// Longest window a trend covers, in buckets. Larger requests are clamped.
pub const MAX_PERIODS: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMode {
    #[default]
    Weekly,
    Monthly,
}

impl TrendMode {
    /// Window size the dashboard uses: 8 weeks or 6 months.
    pub fn default_periods(&self) -> usize {
        match self {
            TrendMode::Weekly => 8,
            TrendMode::Monthly => 6,
        }
    }

    /// Bucket key for a calendar day: `YYYY-Www` or `YYYY-MM`.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            TrendMode::Weekly => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TrendMode::Monthly => format!("{}-{:02}", date.year(), date.month()),
        }
    }

    /// Human-readable label for a bucket key.
    pub fn label(&self, key: &str) -> String {
        match self {
            TrendMode::Weekly => key.replacen('-', " ", 1),
            TrendMode::Monthly => NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d")
                .map(|first| first.format("%b %Y").to_string())
                .unwrap_or_else(|_| key.to_string()),
        }
    }
}

impl fmt::Display for TrendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendMode::Weekly => write!(f, "weekly"),
            TrendMode::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for TrendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Ok(TrendMode::Weekly),
            "monthly" | "month" => Ok(TrendMode::Monthly),
            _ => Err(format!(
                "Invalid trend mode '{}'. Valid options: weekly, monthly",
                s
            )),
        }
    }
}

/// `periods` consecutive bucket keys ending with the one containing `today`,
/// oldest first. `periods` is clamped to [`MAX_PERIODS`].
///
/// Months step back from the first of the current month; weeks step back
/// seven days at a time from `today`.
pub fn bucket_keys(mode: TrendMode, periods: usize, today: NaiveDate) -> Vec<String> {
    let periods = periods.min(MAX_PERIODS);
    let mut keys = Vec::with_capacity(periods);
    let mut cursor = match mode {
        TrendMode::Weekly => Some(today),
        TrendMode::Monthly => today.with_day(1),
    };

    while keys.len() < periods {
        let Some(day) = cursor else {
            break;
        };
        keys.push(mode.key(day));
        cursor = match mode {
            TrendMode::Weekly => day.checked_sub_days(Days::new(7)),
            TrendMode::Monthly => day.checked_sub_months(Months::new(1)),
        };
    }

    keys.reverse();
    keys
}

/// Ordered accumulators, one per bucket.
struct Buckets<A> {
    mode: TrendMode,
    keys: Vec<String>,
    totals: Vec<A>,
    index: HashMap<String, usize>,
}

impl<A: Default> Buckets<A> {
    fn new(mode: TrendMode, periods: usize, today: NaiveDate) -> Self {
        let keys = bucket_keys(mode, periods, today);
        let index = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        let totals = keys.iter().map(|_| A::default()).collect();
        Self {
            mode,
            keys,
            totals,
            index,
        }
    }

    /// Accumulator for the bucket containing `date`, if it is in range.
    fn slot(&mut self, date: Option<NaiveDate>) -> Option<&mut A> {
        let key = self.mode.key(date?);
        let i = *self.index.get(&key)?;
        self.totals.get_mut(i)
    }

    fn into_rows<R>(self, mut row: impl FnMut(String, A) -> R) -> Vec<R> {
        let mode = self.mode;
        self.keys
            .into_iter()
            .zip(self.totals)
            .map(|(key, total)| row(mode.label(&key), total))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTrendOptions {
    pub mode: TrendMode,
    /// Only count sessions of this type.
    pub filter_type: Option<ActivityType>,
    pub periods: usize,
}

impl ActivityTrendOptions {
    pub fn new(mode: TrendMode) -> Self {
        Self {
            mode,
            filter_type: None,
            periods: mode.default_periods(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTrendOptions {
    pub mode: TrendMode,
    pub metric_type: Option<MetricType>,
    pub periods: usize,
}

impl MetricTrendOptions {
    pub fn new(mode: TrendMode) -> Self {
        Self {
            mode,
            metric_type: None,
            periods: mode.default_periods(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityTrendRow {
    pub period: String,
    /// Total minutes.
    pub duration: u64,
    pub sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrendRow {
    pub period: String,
    pub total: f64,
    pub entries: usize,
}

/// Sums minutes and counts sessions per bucket, relative to the local date.
pub fn aggregate_activities(
    records: &[Activity],
    opts: &ActivityTrendOptions,
) -> Vec<ActivityTrendRow> {
    aggregate_activities_at(records, opts, Local::now().date_naive())
}

pub fn aggregate_activities_at(
    records: &[Activity],
    opts: &ActivityTrendOptions,
    today: NaiveDate,
) -> Vec<ActivityTrendRow> {
    let mut buckets: Buckets<(u64, usize)> = Buckets::new(opts.mode, opts.periods, today);

    for activity in records {
        if opts
            .filter_type
            .as_ref()
            .is_some_and(|wanted| *wanted != activity.activity_type)
        {
            continue;
        }
        if let Some((duration, sessions)) = buckets.slot(activity.entry_date()) {
            *duration += u64::from(activity.duration);
            *sessions += 1;
        }
    }

    buckets.into_rows(|period, (duration, sessions)| ActivityTrendRow {
        period,
        duration,
        sessions,
    })
}

/// Sums values and counts entries per bucket, relative to the local date.
pub fn aggregate_metrics(records: &[Metric], opts: &MetricTrendOptions) -> Vec<MetricTrendRow> {
    aggregate_metrics_at(records, opts, Local::now().date_naive())
}

pub fn aggregate_metrics_at(
    records: &[Metric],
    opts: &MetricTrendOptions,
    today: NaiveDate,
) -> Vec<MetricTrendRow> {
    let mut buckets: Buckets<(f64, usize)> = Buckets::new(opts.mode, opts.periods, today);

    for metric in records {
        if opts
            .metric_type
            .as_ref()
            .is_some_and(|wanted| *wanted != metric.metric_type)
        {
            continue;
        }
        if let Some((total, entries)) = buckets.slot(metric.entry_date()) {
            *total += metric.value;
            *entries += 1;
        }
    }

    buckets.into_rows(|period, (total, entries)| MetricTrendRow {
        period,
        total,
        entries,
    })
}

/// Distinct values in first-seen order, for building type pickers.
pub fn distinct_types<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
