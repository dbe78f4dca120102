use clap::{Args, Subcommand};
use uuid::Uuid;

use esteana::db::Store;
use esteana::models::ActionLogEntry;

use super::{day_or_today, OutputFormat};

#[derive(Args)]
pub struct LogCommand {
    #[command(subcommand)]
    pub command: LogSubcommand,
}

#[derive(Subcommand)]
pub enum LogSubcommand {
    /// Record an action
    Add {
        /// Action type (e.g. read_page, charity)
        action: String,

        /// JSON payload
        #[arg(long)]
        payload: Option<String>,
    },

    /// List entries not yet uploaded
    Unsynced {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List entries for a day (UTC)
    Today {
        /// Day to list instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Flag an entry as uploaded
    MarkSynced {
        /// Entry ID (UUID)
        id: Uuid,
    },
}

impl LogCommand {
    pub async fn run(&self, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
        let log = store.action_log();

        match &self.command {
            LogSubcommand::Add { action, payload } => {
                if action.trim().is_empty() {
                    return Err("Action type cannot be empty".into());
                }
                let payload: Option<serde_json::Value> = payload
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()
                    .map_err(|e| format!("Invalid --payload JSON: {}", e))?;
                let entry = log.append(action.trim(), payload).await?;
                println!("Logged {} ({})", entry.action_type, entry.id);
                Ok(())
            }
            LogSubcommand::Unsynced { format } => {
                print_entries(&log.list_unsynced().await?, format)
            }
            LogSubcommand::Today { date, format } => {
                let day = day_or_today(date.as_deref())?;
                print_entries(&log.list_for_day(day).await?, format)
            }
            LogSubcommand::MarkSynced { id } => {
                // Unknown ids are not an error: the entry may have been pruned.
                let known = log.get(*id).await?.is_some();
                log.mark_synced(*id).await?;
                if known {
                    println!("Marked {} as synced", id);
                } else {
                    println!("No entry {}; nothing to mark", id);
                }
                Ok(())
            }
        }
    }
}

fn print_entries(
    entries: &[ActionLogEntry],
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No entries.");
            }
            for e in entries {
                let payload = e
                    .payload
                    .as_ref()
                    .map(|p| format!("  {}", p))
                    .unwrap_or_default();
                println!(
                    "{}  {}  {}{}{}",
                    e.id,
                    e.created_at_key(),
                    e.action_type,
                    if e.synced { "  [synced]" } else { "" },
                    payload
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mark_synced(id: Uuid) -> LogCommand {
        LogCommand {
            command: LogSubcommand::MarkSynced { id },
        }
    }

    #[tokio::test]
    async fn test_mark_synced_unknown_id_succeeds() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("test.db"));

        assert!(mark_synced(Uuid::new_v4()).run(&store).await.is_ok());
    }

    #[tokio::test]
    async fn test_mark_synced_flags_entry() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("test.db"));
        let entry = store.action_log().append("read_page", None).await.unwrap();

        mark_synced(entry.id).run(&store).await.unwrap();
        assert!(store.action_log().list_unsynced().await.unwrap().is_empty());
    }
}
