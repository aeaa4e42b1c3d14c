//! Dashboard summaries: most common types, recent activity pages and
//! per-type progress between the two latest entries.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{Activity, ActivityType, Metric, MetricType};

pub const PAGE_SIZE: usize = 6;
pub const PROGRESS_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount<T> {
    #[serde(rename = "type")]
    pub entry_type: T,
    pub count: usize,
}

/// Most frequent value. Ties go to the value seen first.
pub fn most_common<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Option<TypeCount<T>> {
    let mut counts: Vec<TypeCount<T>> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|c| c.entry_type == item) {
            Some(c) => c.count += 1,
            None => counts.push(TypeCount {
                entry_type: item,
                count: 1,
            }),
        }
    }

    let mut top: Option<TypeCount<T>> = None;
    for c in counts {
        if top.as_ref().map_or(true, |t| c.count > t.count) {
            top = Some(c);
        }
    }
    top
}

/// Newest entry date first; undated entries sort last.
fn by_most_recent(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    b.cmp(&a)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// One page of activities, most recent entry date first.
///
/// There is always at least one page; `page` is clamped to the last one.
pub fn recent_activities(activities: &[Activity], page: usize) -> Page<Activity> {
    let mut sorted = activities.to_vec();
    sorted.sort_by(|a, b| by_most_recent(a.entry_date(), b.entry_date()));

    let total = sorted.len();
    let total_pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = page.min(total_pages - 1);
    let items = sorted
        .into_iter()
        .skip(page * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    Page {
        items,
        page,
        total_pages,
        total,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityProgress {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Minutes, latest minus previous.
    pub delta: i64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricProgress {
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub delta: f64,
    pub unit: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// For each type with at least two entries, its (latest, previous) pair
/// by entry date. Types keep first-seen order.
fn latest_pairs<E, T, F, D>(items: &[E], type_of: F, date_of: D) -> Vec<(T, &E, &E)>
where
    T: PartialEq,
    F: Fn(&E) -> T,
    D: Fn(&E) -> Option<NaiveDate>,
{
    let mut groups: Vec<(T, Vec<&E>)> = Vec::new();
    for item in items {
        let t = type_of(item);
        match groups.iter_mut().find(|(g, _)| *g == t) {
            Some((_, list)) => list.push(item),
            None => groups.push((t, vec![item])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(t, mut list)| {
            list.sort_by(|a, b| by_most_recent(date_of(*a), date_of(*b)));
            match list.as_slice() {
                [latest, previous, ..] => Some((t, *latest, *previous)),
                _ => None,
            }
        })
        .collect()
}

/// Largest duration changes between each type's two latest sessions.
pub fn activity_progress(activities: &[Activity], limit: usize) -> Vec<ActivityProgress> {
    let mut progress: Vec<ActivityProgress> =
        latest_pairs(activities, |a| a.activity_type.clone(), Activity::entry_date)
            .into_iter()
            .map(|(activity_type, latest, previous)| ActivityProgress {
                activity_type,
                delta: i64::from(latest.duration) - i64::from(previous.duration),
                from: previous.entry_date(),
                to: latest.entry_date(),
            })
            .collect();

    progress.sort_by_key(|p| std::cmp::Reverse(p.delta.unsigned_abs()));
    progress.truncate(limit);
    progress
}

/// Largest value changes between each type's two latest entries.
pub fn metric_progress(metrics: &[Metric], limit: usize) -> Vec<MetricProgress> {
    let mut progress: Vec<MetricProgress> =
        latest_pairs(metrics, |m| m.metric_type.clone(), Metric::entry_date)
            .into_iter()
            .map(|(metric_type, latest, previous)| {
                let unit = if latest.unit.is_empty() {
                    previous.unit.clone()
                } else {
                    latest.unit.clone()
                };
                MetricProgress {
                    metric_type,
                    delta: latest.value - previous.value,
                    unit,
                    from: previous.entry_date(),
                    to: latest.entry_date(),
                }
            })
            .collect();

    progress.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    progress.truncate(limit);
    progress
}

/// Everything the dashboard shows, computed from the two collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub most_common_activity: Option<TypeCount<ActivityType>>,
    pub most_common_metric: Option<TypeCount<MetricType>>,
    pub recent: Page<Activity>,
    pub activity_progress: Vec<ActivityProgress>,
    pub metric_progress: Vec<MetricProgress>,
}

impl DashboardOverview {
    pub fn build(activities: &[Activity], metrics: &[Metric], page: usize) -> Self {
        Self {
            most_common_activity: most_common(activities.iter().map(|a| a.activity_type.clone())),
            most_common_metric: most_common(metrics.iter().map(|m| m.metric_type.clone())),
            recent: recent_activities(activities, page),
            activity_progress: activity_progress(activities, PROGRESS_LIMIT),
            metric_progress: metric_progress(metrics, PROGRESS_LIMIT),
        }
    }
}
