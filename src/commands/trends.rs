use clap::builder::RangedU64ValueParser;
use clap::{Args, Subcommand};
use todu_health_core::{
    aggregate_activities, aggregate_metrics, distinct_types, ActivityTrendOptions,
    ActivityTrendRow, ActivityType, MetricTrendOptions, MetricTrendRow, MetricType, RecordStore,
    TrendMode, MAX_PERIODS,
};

use super::OutputFormat;
use crate::config::Config;

const BAR_WIDTH: usize = 30;

#[derive(Args)]
pub struct TrendsCommand {
    #[command(subcommand)]
    pub command: TrendsSubcommand,
}

#[derive(Subcommand)]
pub enum TrendsSubcommand {
    /// Minutes and sessions per week or month
    Activities {
        /// Bucket size (weekly, monthly)
        #[arg(long, short, default_value = "weekly")]
        mode: TrendMode,

        /// Only count sessions of this type
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        activity_type: Option<ActivityType>,

        /// Number of periods, defaults to the configured window
        #[arg(long, short, value_parser = periods_parser())]
        periods: Option<usize>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Metric totals and entry counts per week or month
    Metrics {
        /// Bucket size (weekly, monthly)
        #[arg(long, short, default_value = "weekly")]
        mode: TrendMode,

        /// Only count entries of this type
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        metric_type: Option<MetricType>,

        /// Number of periods, defaults to the configured window
        #[arg(long, short, value_parser = periods_parser())]
        periods: Option<usize>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn periods_parser() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..=MAX_PERIODS as u64)
}

fn default_periods(mode: TrendMode, config: &Config) -> usize {
    match mode {
        TrendMode::Weekly => config.weekly_periods.value,
        TrendMode::Monthly => config.monthly_periods.value,
    }
}

impl TrendsCommand {
    pub fn run(
        &self,
        store: &RecordStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TrendsSubcommand::Activities {
                mode,
                activity_type,
                periods,
                format,
            } => {
                let activities = store.activities();
                let opts = ActivityTrendOptions {
                    mode: *mode,
                    filter_type: activity_type.clone(),
                    periods: periods.unwrap_or_else(|| default_periods(*mode, config)),
                };
                let rows = aggregate_activities(&activities, &opts);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    }
                    OutputFormat::Text => {
                        let title = match activity_type {
                            Some(t) => format!("{} activity trends ({})", mode, t),
                            None => format!("{} activity trends", mode),
                        };
                        println!("{}", capitalize(&title));
                        println!("{}", "=".repeat(30));
                        print_activity_rows(&rows);

                        let types =
                            distinct_types(activities.iter().map(|a| &a.activity_type));
                        if !types.is_empty() {
                            let names: Vec<&str> = types
                                .iter()
                                .map(|t| t.as_str())
                                .filter(|n| !n.is_empty())
                                .collect();
                            println!("\nTypes logged: {}", names.join(", "));
                        }
                    }
                }
                Ok(())
            }
            TrendsSubcommand::Metrics {
                mode,
                metric_type,
                periods,
                format,
            } => {
                let metrics = store.metrics();
                let opts = MetricTrendOptions {
                    mode: *mode,
                    metric_type: metric_type.clone(),
                    periods: periods.unwrap_or_else(|| default_periods(*mode, config)),
                };
                let rows = aggregate_metrics(&metrics, &opts);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    }
                    OutputFormat::Text => {
                        let title = match metric_type {
                            Some(t) => format!("{} {} trends ({})", mode, t, t.unit()),
                            None => format!("{} metric trends (all types)", mode),
                        };
                        println!("{}", capitalize(&title));
                        println!("{}", "=".repeat(30));
                        print_metric_rows(&rows);

                        let types = distinct_types(metrics.iter().map(|m| &m.metric_type));
                        if !types.is_empty() {
                            let names: Vec<&str> = types
                                .iter()
                                .map(|t| t.as_str())
                                .filter(|n| !n.is_empty())
                                .collect();
                            println!("\nTypes logged: {}", names.join(", "));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_activity_rows(rows: &[ActivityTrendRow]) {
    let max = rows.iter().map(|r| r.duration as f64).fold(0.0, f64::max);
    println!("{:<10} {:>8} {:>8}", "PERIOD", "MINUTES", "SESSIONS");
    for row in rows {
        println!(
            "{:<10} {:>8} {:>8}  {}",
            row.period,
            row.duration,
            row.sessions,
            bar(row.duration as f64, max)
        );
    }
}

fn print_metric_rows(rows: &[MetricTrendRow]) {
    let max = rows.iter().map(|r| r.total).fold(0.0, f64::max);
    println!("{:<10} {:>10} {:>8}", "PERIOD", "TOTAL", "ENTRIES");
    for row in rows {
        println!(
            "{:<10} {:>10} {:>8}  {}",
            row.period,
            format!("{:.1}", row.total),
            row.entries,
            bar(row.total, max)
        );
    }
}

/// Horizontal bar scaled against the largest value in the table.
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let width = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "#".repeat(width)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
