use clap::Args;
use todu_health_core::dashboard::{ActivityProgress, MetricProgress};
use todu_health_core::{DashboardOverview, LiveCollection, RecordStore};

use super::{fmt_date, OutputFormat};

#[derive(Args)]
pub struct DashboardCommand {
    /// Page of recent activities to show (starting at 1)
    #[arg(long, short, default_value_t = 1)]
    page: usize,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl DashboardCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        let activities = LiveCollection::activities(store).data();
        let metrics = LiveCollection::metrics(store).data();
        let overview = DashboardOverview::build(&activities, &metrics, self.page.saturating_sub(1));

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            }
            OutputFormat::Text => print_overview(&overview),
        }

        Ok(())
    }
}

fn print_overview(overview: &DashboardOverview) {
    println!("Dashboard");
    println!("{}", "=".repeat(30));

    match &overview.most_common_activity {
        Some(top) => println!(
            "Most common activity: {} ({} session(s))",
            top.entry_type, top.count
        ),
        None => println!("Most common activity: -"),
    }
    match &overview.most_common_metric {
        Some(top) => println!(
            "Most tracked metric:  {} ({} entry(ies))",
            top.entry_type, top.count
        ),
        None => println!("Most tracked metric:  -"),
    }

    let recent = &overview.recent;
    println!();
    println!(
        "Recent activities (page {} of {})",
        recent.page + 1,
        recent.total_pages
    );
    println!("{}", "-".repeat(60));
    if recent.items.is_empty() {
        println!("  No activities logged yet.");
    }
    for a in &recent.items {
        println!(
            "  {:<12} {:<10} {:>5} min  {}",
            fmt_date(a.entry_date()),
            a.activity_type.as_str(),
            a.duration,
            a.notes
        );
    }

    println!();
    println!("Activity progress");
    println!("{}", "-".repeat(60));
    if overview.activity_progress.is_empty() {
        println!("  Log at least two sessions of a type to see progress.");
    }
    for p in &overview.activity_progress {
        println!("  {}", activity_progress_line(p));
    }

    println!();
    println!("Metric progress");
    println!("{}", "-".repeat(60));
    if overview.metric_progress.is_empty() {
        println!("  Log at least two entries of a type to see progress.");
    }
    for p in &overview.metric_progress {
        println!("  {}", metric_progress_line(p));
    }
}

fn direction(delta: f64) -> &'static str {
    if delta >= 0.0 {
        "Increase"
    } else {
        "Decrease"
    }
}

fn activity_progress_line(p: &ActivityProgress) -> String {
    format!(
        "{:<10} {} of {} minutes ({} -> {})",
        p.activity_type.as_str(),
        direction(p.delta as f64),
        p.delta.unsigned_abs(),
        fmt_date(p.from),
        fmt_date(p.to)
    )
}

fn metric_progress_line(p: &MetricProgress) -> String {
    let unit = if p.unit.is_empty() {
        String::new()
    } else {
        format!(" {}", p.unit)
    };
    format!(
        "{:<10} {} of {}{} ({} -> {})",
        p.metric_type.as_str(),
        direction(p.delta),
        p.delta.abs().round(),
        unit,
        fmt_date(p.from),
        fmt_date(p.to)
    )
}
