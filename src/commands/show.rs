use chrono::{DateTime, Local};
use clap::Args;
use todu_health_core::{LocalRecordsRepository, Record, RecordStore, RecordsRepository};

use super::{fmt_date, OutputFormat};

#[derive(Args)]
pub struct ShowCommand {
    /// Record ID
    id: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ShowCommand {
    pub async fn run(&self, store: &RecordStore) -> Result<(), Box<dyn std::error::Error>> {
        let repo = LocalRecordsRepository::new(store.clone());

        let Some(record) = repo.get_by_id(&self.id).await else {
            println!("Record not found: {}", self.id);
            return Ok(());
        };

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            OutputFormat::Text => print_detail(&record),
        }

        Ok(())
    }
}

fn print_detail(record: &Record) {
    print!("{}", record);
    println!();
    println!("Kind:       {}", record.kind());
    println!("Entry date: {}", fmt_date(record.entry_date()));
    println!("Logged at:  {}", fmt_created_at(record.created_at()));
    println!("ID:         {}", record.id());
}

fn fmt_created_at(millis: i64) -> String {
    if millis == 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
