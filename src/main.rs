use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    AcquireCommand, BookmarkCommand, BridgeCommand, ChaptersCommand, ConfigCommand, LogCommand,
    SettingsCommand, SyncCommand, TasksCommand, WisdomCommand,
};
use esteana::config::Config;
use esteana::db::Store;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "esteana=info";

#[derive(Parser)]
#[command(name = "esteana")]
#[command(version)]
#[command(about = "Offline-first scripture, daily tasks and action log", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the scripture store from the first reachable source
    Acquire(AcquireCommand),

    /// List stored chapters
    Chapters(ChaptersCommand),

    /// Manage profile settings
    Settings(SettingsCommand),

    /// Manage verse bookmarks
    Bookmark(BookmarkCommand),

    /// Record and inspect the action log
    Log(LogCommand),

    /// Show the wisdom of the day
    Wisdom(WisdomCommand),

    /// Show today's tasks
    Tasks(TasksCommand),

    /// Upload unsynced action-log entries
    Sync(SyncCommand),

    /// Talk to a running host over its bridge
    Bridge(BridgeCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
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

    // Load configuration
    let config = Config::load(cli.config)?;
    let store = Store::new(config.database_path.value.clone());

    match cli.command {
        Some(Commands::Acquire(cmd)) => cmd.run(&store, &config).await?,
        Some(Commands::Chapters(cmd)) => cmd.run(&store).await?,
        Some(Commands::Settings(cmd)) => cmd.run(&store).await?,
        Some(Commands::Bookmark(cmd)) => cmd.run(&store).await?,
        Some(Commands::Log(cmd)) => cmd.run(&store).await?,
        Some(Commands::Wisdom(cmd)) => cmd.run(&config).await?,
        Some(Commands::Tasks(cmd)) => cmd.run(&store, &config).await?,
        Some(Commands::Sync(cmd)) => cmd.run(&store, &config).await?,
        Some(Commands::Bridge(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
