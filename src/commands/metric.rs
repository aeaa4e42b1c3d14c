use clap::{Args, Subcommand};
use todu_health_core::{
    log_metric, EntryError, LiveCollection, Metric, MetricDraft, MetricType, RecordStore,
};

use super::{fmt_date, print_validation_errors, today, OutputFormat};

#[derive(Args)]
pub struct MetricCommand {
    #[command(subcommand)]
    pub command: MetricSubcommand,
}

#[derive(Subcommand)]
pub enum MetricSubcommand {
    /// Log a health measurement
    Log {
        /// Metric type (steps, water, sleep, calories)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        metric_type: Option<String>,

        /// Measured value, in the type's unit
        #[arg(long, short)]
        value: Option<String>,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Add notes to the entry
        #[arg(long)]
        notes: Option<String>,
    },

    /// List logged measurements, most recent first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show entries of this type
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        metric_type: Option<MetricType>,

        /// Maximum number of entries to show
        #[arg(long, short)]
        limit: Option<usize>,
    },
}

impl MetricCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MetricSubcommand::Log {
                metric_type,
                value,
                date,
                notes,
            } => {
                let today = today();
                let draft = MetricDraft {
                    date: date.clone().unwrap_or_else(|| today.to_string()),
                    metric_type: metric_type.clone().unwrap_or_default(),
                    value: value.clone().unwrap_or_default(),
                    notes: notes.clone().unwrap_or_default(),
                };

                match log_metric(store, &draft, today) {
                    Ok(metric) => {
                        println!("Logged metric:");
                        println!();
                        print!("{}", metric);
                        println!();
                        println!("Metric ID: {}", metric.id);
                        Ok(())
                    }
                    Err(EntryError::Invalid(errors)) => {
                        print_validation_errors(&errors);
                        Err("Metric was not logged".into())
                    }
                    Err(e) => Err(e.into()),
                }
            }
            MetricSubcommand::List {
                format,
                metric_type,
                limit,
            } => {
                let live = LiveCollection::metrics(store);
                let mut metrics: Vec<Metric> = live
                    .data()
                    .into_iter()
                    .filter(|m| {
                        metric_type
                            .as_ref()
                            .map_or(true, |t| m.metric_type == *t)
                    })
                    .collect();
                metrics.sort_by(|a, b| b.entry_date().cmp(&a.entry_date()));
                if let Some(n) = limit {
                    metrics.truncate(*n);
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&metrics)?);
                    }
                    OutputFormat::Text => {
                        if metrics.is_empty() {
                            println!("No metrics found.");
                            return Ok(());
                        }

                        println!("{:<12} {:<10} {:>14}  {}", "DATE", "TYPE", "VALUE", "NOTES");
                        println!("{}", "-".repeat(60));
                        for m in &metrics {
                            println!(
                                "{:<12} {:<10} {:>14}  {}",
                                fmt_date(m.entry_date()),
                                m.metric_type.as_str(),
                                format!("{} {}", m.value, m.unit),
                                m.notes
                            );
                        }
                        println!("\nTotal: {} metric(s)", metrics.len());
                    }
                }
                Ok(())
            }
        }
    }
}
