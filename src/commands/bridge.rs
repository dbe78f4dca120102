use std::io::Write;

use clap::{Args, Subcommand};

use esteana::bridge::{self, BridgeClient};
use esteana::config::Config;

/// Talk to a running host over its bridge
#[derive(Args)]
pub struct BridgeCommand {
    #[command(subcommand)]
    pub command: BridgeSubcommand,
}

#[derive(Subcommand)]
pub enum BridgeSubcommand {
    /// Ask the host for a haptic pulse
    Vibrate,

    /// Print the host's push token
    PushToken,

    /// Fetch a bundled asset and write it to stdout
    Asset {
        /// Path inside the bundle (e.g. quran.json)
        path: String,
    },
}

impl BridgeCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = connect(config).await?;

        match &self.command {
            BridgeSubcommand::Vibrate => {
                client.vibrate();
                // A round trip guarantees the frame was written before exit.
                client.push_token().await.ok();
                println!("Vibration requested.");
            }
            BridgeSubcommand::PushToken => {
                let token = client.push_token().await?;
                if token.is_empty() {
                    println!("(no push token)");
                } else {
                    println!("{}", token);
                }
            }
            BridgeSubcommand::Asset { path } => {
                let bytes = client.load_asset(path).await?;
                std::io::stdout().write_all(&bytes)?;
            }
        }
        Ok(())
    }
}

async fn connect(config: &Config) -> Result<BridgeClient, Box<dyn std::error::Error>> {
    let default_url;
    let url = match &config.bridge_url.value {
        Some(url) => url.as_str(),
        None => {
            default_url = format!("ws://{}/__bridge", config.host_addr.value);
            default_url.as_str()
        }
    };
    Ok(bridge::connect(url).await?)
}
