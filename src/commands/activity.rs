use clap::{Args, Subcommand};
use todu_health_core::{
    log_activity, Activity, ActivityDraft, ActivityType, EntryError, LiveCollection, RecordStore,
};

use super::{fmt_date, print_validation_errors, today, OutputFormat};

#[derive(Args)]
pub struct ActivityCommand {
    #[command(subcommand)]
    pub command: ActivitySubcommand,
}

#[derive(Subcommand)]
pub enum ActivitySubcommand {
    /// Log a workout session
    Log {
        /// Activity type (running, cycling, gym, swimming, yoga, walking, other)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        activity_type: Option<String>,

        /// Duration in minutes
        #[arg(long, short)]
        duration: Option<String>,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Add notes to the session
        #[arg(long)]
        notes: Option<String>,
    },

    /// List logged sessions, most recent first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show sessions of this type
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        activity_type: Option<ActivityType>,

        /// Maximum number of sessions to show
        #[arg(long, short)]
        limit: Option<usize>,
    },
}

impl ActivityCommand {
    pub fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ActivitySubcommand::Log {
                activity_type,
                duration,
                date,
                notes,
            } => {
                let today = today();
                let draft = ActivityDraft {
                    date: date.clone().unwrap_or_else(|| today.to_string()),
                    activity_type: activity_type.clone().unwrap_or_default(),
                    duration: duration.clone().unwrap_or_default(),
                    notes: notes.clone().unwrap_or_default(),
                };

                match log_activity(store, &draft, today) {
                    Ok(activity) => {
                        println!("Logged activity:");
                        println!();
                        print!("{}", activity);
                        println!();
                        println!("Activity ID: {}", activity.id);
                        Ok(())
                    }
                    Err(EntryError::Invalid(errors)) => {
                        print_validation_errors(&errors);
                        Err("Activity was not logged".into())
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ActivitySubcommand::List {
                format,
                activity_type,
                limit,
            } => {
                let live = LiveCollection::activities(store);
                let mut activities: Vec<Activity> = live
                    .data()
                    .into_iter()
                    .filter(|a| {
                        activity_type
                            .as_ref()
                            .map_or(true, |t| a.activity_type == *t)
                    })
                    .collect();
                activities.sort_by(|a, b| b.entry_date().cmp(&a.entry_date()));
                if let Some(n) = limit {
                    activities.truncate(*n);
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&activities)?);
                    }
                    OutputFormat::Text => {
                        if activities.is_empty() {
                            println!("No activities found.");
                            return Ok(());
                        }

                        println!(
                            "{:<12} {:<10} {:>9}  {}",
                            "DATE", "TYPE", "DURATION", "NOTES"
                        );
                        println!("{}", "-".repeat(60));
                        for a in &activities {
                            println!(
                                "{:<12} {:<10} {:>5} min  {}",
                                fmt_date(a.entry_date()),
                                a.activity_type.as_str(),
                                a.duration,
                                a.notes
                            );
                        }
                        println!("\nTotal: {} activity(ies)", activities.len());
                    }
                }
                Ok(())
            }
        }
    }
}
