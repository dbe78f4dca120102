//! Upload the local action log to the sync server.

use clap::{Args, Subcommand};

use esteana::config::Config;
use esteana::db::Store;
use esteana::sync::ActionLogUploader;

/// Upload unsynced action-log entries
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and the pending queue
    Status,
}

impl SyncCommand {
    pub async fn run(&self, store: &Store, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => {
                let uploader = ActionLogUploader::from_config(&config.sync)?;
                let report = uploader.upload(store).await?;
                if report.attempted == 0 {
                    println!("Nothing to upload.");
                } else {
                    println!(
                        "Uploaded {} of {} entr{}.",
                        report.synced,
                        report.attempted,
                        if report.attempted == 1 { "y" } else { "ies" }
                    );
                }
                Ok(())
            }
            Some(SyncSubcommand::Status) => {
                println!("Sync Configuration");
                println!("==================");
                println!();
                match (&config.sync.server_url, config.sync.is_configured()) {
                    (Some(url), true) => println!("Server: {}", url),
                    _ => {
                        println!("Status: Not configured");
                        println!();
                        println!("To enable upload, add to your config file:");
                        println!();
                        println!("  sync:");
                        println!("    server_url: \"https://sync.example.com\"");
                        println!("    api_key: \"your-api-key\"");
                        println!();
                        println!("Or set ESTEANA_SYNC_URL and ESTEANA_SYNC_API_KEY.");
                    }
                }
                let pending = store.action_log().list_unsynced().await?.len();
                println!("Pending entries: {}", pending);
                Ok(())
            }
        }
    }
}
