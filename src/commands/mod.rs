mod bookmark;
mod bridge;
mod config_cmd;
mod daily;
mod log;
mod scripture;
mod settings;
mod sync_cmd;

pub use bookmark::BookmarkCommand;
pub use bridge::BridgeCommand;
pub use config_cmd::ConfigCommand;
pub use daily::{TasksCommand, WisdomCommand};
pub use log::LogCommand;
pub use scripture::{AcquireCommand, ChaptersCommand};
pub use settings::SettingsCommand;
pub use sync_cmd::SyncCommand;

use chrono::{NaiveDate, Utc};
use clap::ValueEnum;

use esteana::acquisition::Environment;
use esteana::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Content environment from config, with the host bridge attached when
/// `bridge_url` is set.
pub async fn environment(config: &Config) -> Result<Environment, Box<dyn std::error::Error>> {
    let env = config.environment()?;
    match &config.bridge_url.value {
        Some(url) => {
            let client = esteana::bridge::connect(url).await?;
            tracing::debug!(url = %url, "connected to host bridge");
            Ok(env.with_bridge(client))
        }
        None => Ok(env),
    }
}

/// Parses `YYYY-MM-DD`, defaulting to the current UTC day.
pub fn day_or_today(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD", s).into()),
        None => Ok(Utc::now().date_naive()),
    }
}
