mod activity;
mod config_cmd;
mod dashboard;
mod metric;
mod search;
mod show;
mod trends;

pub use activity::ActivityCommand;
pub use config_cmd::ConfigCommand;
pub use dashboard::DashboardCommand;
pub use metric::MetricCommand;
pub use search::SearchCommand;
pub use show::ShowCommand;
pub use trends::TrendsCommand;

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use todu_health_core::ValidationErrors;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Prints field errors the way the entry forms list them.
pub(crate) fn print_validation_errors(errors: &ValidationErrors) {
    eprintln!("Please fix the following:");
    for e in &errors.errors {
        eprintln!("  - {}: {}", e.field, e.message);
    }
}

/// "2026-10-19" for a known date, "-" otherwise.
pub(crate) fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
