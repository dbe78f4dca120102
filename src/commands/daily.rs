use clap::Args;

use esteana::config::Config;
use esteana::daily::{DailyTasks, WisdomCatalog};
use esteana::db::Store;

use super::{day_or_today, environment, OutputFormat};

/// Show the wisdom of the day
#[derive(Args)]
pub struct WisdomCommand {
    /// Day to pick for instead of today (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl WisdomCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let day = day_or_today(self.date.as_deref())?;
        let catalog = WisdomCatalog::new(environment(config).await?.asset_loader()?);

        match (catalog.for_day(day).await, &self.format) {
            (Some(wisdom), OutputFormat::Json) => {
                println!("{}", serde_json::to_string_pretty(&wisdom)?)
            }
            (Some(wisdom), OutputFormat::Text) => {
                println!("{}", wisdom.text);
                println!("  ({}: {})", wisdom.kind, wisdom.source);
            }
            (None, OutputFormat::Json) => println!("null"),
            (None, OutputFormat::Text) => println!("No wisdom available."),
        }
        Ok(())
    }
}

/// Show today's tasks for the profile's age group
#[derive(Args)]
pub struct TasksCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl TasksCommand {
    pub async fn run(&self, store: &Store, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let loader = environment(config).await?.asset_loader()?;
        let progress = DailyTasks::load(&loader).await.progress(store).await?;

        match self.format {
            OutputFormat::Json => {
                let rows: Vec<_> = progress
                    .iter()
                    .map(|t| serde_json::json!({ "id": t.id, "done": t.done }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Text => {
                let done = progress.iter().filter(|t| t.done).count();
                println!("Today: {}/{} done", done, progress.len());
                for task in &progress {
                    println!("  [{}] {}", if task.done { "x" } else { " " }, task.id);
                }
            }
        }
        Ok(())
    }
}
