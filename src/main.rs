use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use todu_health_core::{FileStore, RecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ActivityCommand, ConfigCommand, DashboardCommand, MetricCommand, SearchCommand, ShowCommand,
    TrendsCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "health")]
#[command(version)]
#[command(about = "Log workouts and health metrics, search them and see trends", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log and list workout sessions
    Activity(ActivityCommand),

    /// Log and list health metrics
    Metric(MetricCommand),

    /// Search activities and metrics together
    Search(SearchCommand),

    /// Show a single record by ID
    Show(ShowCommand),

    /// Weekly or monthly trends
    Trends(TrendsCommand),

    /// Summary of recent activity and progress
    Dashboard(DashboardCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for config commands
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;
    tracing::debug!("Using data directory {}", config.data_dir.value.display());

    let files = FileStore::new(config.data_dir.value.clone());
    let store = RecordStore::new(Arc::new(files.clone()));

    match cli.command {
        Some(Commands::Activity(cmd)) => cmd.run(&store)?,
        Some(Commands::Metric(cmd)) => cmd.run(&store)?,
        Some(Commands::Search(cmd)) => cmd.run(&files, &store, &config).await?,
        Some(Commands::Show(cmd)) => cmd.run(&store).await?,
        Some(Commands::Trends(cmd)) => cmd.run(&store, &config)?,
        Some(Commands::Dashboard(cmd)) => cmd.run(&store)?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
