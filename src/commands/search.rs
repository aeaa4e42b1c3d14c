use clap::Args;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use todu_health_core::{
    FileStore, LocalRecordsRepository, Record, RecordKind, RecordStore, RecordsRepository,
    RecordsSearch, SearchFilters, StorageWatcher,
};

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct SearchCommand {
    /// Words to look for; every word must appear
    query: Vec<String>,

    /// Only match this kind of record (activity, metric)
    #[arg(long, short)]
    kind: Option<RecordKind>,

    /// Only match records logged for this date (YYYY-MM-DD)
    #[arg(long, short)]
    date: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Keep running: re-print results when the data changes and read new
    /// queries from stdin, one per line
    #[arg(long, short)]
    watch: bool,
}

impl SearchCommand {
    pub async fn run(
        &self,
        files: &FileStore,
        store: &RecordStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let repo = Arc::new(LocalRecordsRepository::new(store.clone()));
        let search = RecordsSearch::new(repo, config.debounce());

        let mut filters = SearchFilters::default();
        if let Some(kind) = self.kind {
            filters = filters.kind(kind);
        }
        if let Some(date) = &self.date {
            filters = filters.date(date.clone());
        }
        search.set_filters(filters);
        search.set_query(self.query.join(" "));
        search.settled().await;

        print_results(&search, &self.format)?;

        if !self.watch {
            return Ok(());
        }

        let _watcher = StorageWatcher::start(files.clone(), store.bus().clone())?;
        eprintln!(
            "Watching {} for changes. Type a new query and press Enter; Ctrl-D to quit.",
            files.data_dir().display()
        );

        let mut changes = search.changes();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if !search.is_loading() && search.debounced_query() == search.query() {
                        print_results(&search, &self.format)?;
                    }
                }
                line = lines.next_line() => {
                    match line? {
                        Some(query) => search.set_query(query.trim()),
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }
}

fn print_results<R>(
    search: &RecordsSearch<R>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: RecordsRepository + 'static,
{
    let results = search.results();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Text => {
            let query = search.debounced_query();
            if query.trim().is_empty() {
                println!("{} of {} record(s)", results.len(), search.all_count());
            } else {
                println!(
                    "Search \"{}\": {} of {} record(s)",
                    query,
                    results.len(),
                    search.all_count()
                );
            }
            println!("{}", "-".repeat(60));

            if results.is_empty() {
                println!("No matching records.");
            }
            for record in &results {
                println!("{}", summary_line(record));
            }
        }
    }

    Ok(())
}

/// One-line summary used in search listings.
pub(crate) fn summary_line(record: &Record) -> String {
    let amount = match record {
        Record::Activity(a) => format!("{} min", a.duration),
        Record::Metric(m) => format!("{} {}", m.value, m.unit),
    };
    let mut line = format!(
        "{:<8} {:<12} {:<10} {:<12}",
        record.kind().to_string(),
        record.date_iso(),
        record.type_name(),
        amount
    );
    if !record.notes().is_empty() {
        line.push(' ');
        line.push_str(record.notes());
    }
    line.push_str(&format!("  [{}]", record.id()));
    line
}
