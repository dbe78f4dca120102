use clap::{Args, Subcommand};
use std::fmt::Display;

use esteana::config::{Config, ConfigSource, ConfigValue};

use super::OutputFormat;

const CONFIG_TEMPLATE: &str = r#"# esteana configuration
# database_path: esteana.db
# origin: https://app.esteana.local/
# asset_host: app.esteana.local
# host_addr: 127.0.0.1:8080
# bridge_url: ws://127.0.0.1:8080/__bridge
# api_url: https://api.alquran.cloud/v1/quran/quran-uthmani
# mirror_url: https://cdn.esteana.app/quran.json
# sync:
#   server_url: https://sync.example.com
#   api_key: your-api-key
"#;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a commented config file at the default location
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print_config(config),
                }
                Ok(())
            }
            ConfigSubcommand::Init { force } => {
                let path = config
                    .config_file
                    .clone()
                    .unwrap_or_else(Config::default_config_path);
                if path.exists() && !force {
                    return Err(format!(
                        "Config file already exists: {} (use --force to overwrite)",
                        path.display()
                    )
                    .into());
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, CONFIG_TEMPLATE)?;
                println!("Wrote {}", path.display());
                Ok(())
            }
        }
    }
}

fn print_config(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    print_value(
        "database_path",
        &config.database_path.value.display(),
        &config.database_path.source,
    );
    print_entry("origin", &config.origin);
    print_entry("asset_host", &config.asset_host);
    print_entry("host_addr", &config.host_addr);
    print_value(
        "bridge_url",
        &config.bridge_url.value.as_deref().unwrap_or("(none)"),
        &config.bridge_url.source,
    );
    print_entry("api_url", &config.api_url);
    print_entry("mirror_url", &config.mirror_url);

    println!(
        "sync: {}",
        if config.sync.is_configured() {
            "configured"
        } else {
            "not configured"
        }
    );
}

fn print_entry(key: &str, entry: &ConfigValue<String>) {
    print_value(key, &entry.value, &entry.source);
}

fn print_value(key: &str, value: &dyn Display, source: &ConfigSource) {
    println!("{}: {}", key, value);
    println!("  source: {}", source);
    println!();
}
