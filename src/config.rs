use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::acquisition::{Endpoints, Environment, DEFAULT_API_URL, DEFAULT_LOCAL_PATH, DEFAULT_MIRROR_URL};

pub const DEFAULT_ASSET_HOST: &str = "app.esteana.local";
pub const DEFAULT_ORIGIN: &str = "https://app.esteana.local/";
pub const DEFAULT_HOST_ADDR: &str = "127.0.0.1:8080";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// Action-log upload configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Upload server base URL (e.g., "https://sync.example.com")
    pub server_url: Option<String>,
    /// API key sent as a Bearer token
    pub api_key: Option<String>,
}

impl SyncConfig {
    /// Returns true if upload is configured (has both server_url and api_key)
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }
}

/// Content-side configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite document store
    pub database_path: ConfigValue<PathBuf>,
    /// URL the content is served from; decides hosted vs networked
    pub origin: ConfigValue<String>,
    /// Reserved hostname the native host intercepts
    pub asset_host: ConfigValue<String>,
    /// Address the native host listens on
    pub host_addr: ConfigValue<String>,
    /// Websocket URL of the host bridge, if one should be used
    pub bridge_url: ConfigValue<Option<String>>,
    /// Remote scripture API
    pub api_url: ConfigValue<String>,
    /// Fixed remote mirror tried last when hosted
    pub mirror_url: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Action-log upload configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    origin: Option<String>,
    asset_host: Option<String>,
    host_addr: Option<String>,
    bridge_url: Option<String>,
    api_url: Option<String>,
    mirror_url: Option<String>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default = |value: &str| ConfigValue::new(value.to_string(), ConfigSource::Default);

        let mut config = Self {
            database_path: ConfigValue::new(
                Self::default_data_dir().join("esteana.db"),
                ConfigSource::Default,
            ),
            origin: default(DEFAULT_ORIGIN),
            asset_host: default(DEFAULT_ASSET_HOST),
            host_addr: default(DEFAULT_HOST_ADDR),
            bridge_url: ConfigValue::new(None, ConfigSource::Default),
            api_url: default(DEFAULT_API_URL),
            mirror_url: default(DEFAULT_MIRROR_URL),
            config_file: None,
            sync: SyncConfig::default(),
        };

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config.config_file = Some(path.clone());
            config.apply_file(file_config, &path);
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile, path: &std::path::Path) {
        let from_file = ConfigSource::File;
        if let Some(db_path) = file.database_path {
            // Resolve relative paths against config file's directory
            let resolved = if db_path.is_relative() {
                path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
            } else {
                db_path
            };
            self.database_path.set(resolved, from_file.clone());
        }
        if let Some(origin) = file.origin {
            self.origin.set(origin, from_file.clone());
        }
        if let Some(host) = file.asset_host {
            self.asset_host.set(host, from_file.clone());
        }
        if let Some(addr) = file.host_addr {
            self.host_addr.set(addr, from_file.clone());
        }
        if let Some(url) = file.bridge_url {
            self.bridge_url.set(Some(url), from_file.clone());
        }
        if let Some(url) = file.api_url {
            self.api_url.set(url, from_file.clone());
        }
        if let Some(url) = file.mirror_url {
            self.mirror_url.set(url, from_file);
        }
        if let Some(sync) = file.sync {
            self.sync = sync;
        }
    }

    fn apply_env(&mut self) {
        let env = ConfigSource::Environment;
        if let Ok(db_path) = std::env::var("ESTEANA_DATABASE_PATH") {
            self.database_path.set(PathBuf::from(db_path), env.clone());
        }
        if let Ok(origin) = std::env::var("ESTEANA_ORIGIN") {
            self.origin.set(origin, env.clone());
        }
        if let Ok(addr) = std::env::var("ESTEANA_HOST_ADDR") {
            self.host_addr.set(addr, env.clone());
        }
        if let Ok(url) = std::env::var("ESTEANA_BRIDGE_URL") {
            self.bridge_url.set(Some(url), env.clone());
        }
        if let Ok(url) = std::env::var("ESTEANA_API_URL") {
            self.api_url.set(url, env.clone());
        }
        if let Ok(url) = std::env::var("ESTEANA_MIRROR_URL") {
            self.mirror_url.set(url, env);
        }
        // Sync env var overrides
        if let Ok(url) = std::env::var("ESTEANA_SYNC_URL") {
            self.sync.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("ESTEANA_SYNC_API_KEY") {
            self.sync.api_key = Some(key);
        }
    }

    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin.value).map_err(|e| ConfigError::Invalid {
            key: "origin",
            value: self.origin.value.clone(),
            reason: e.to_string(),
        })
    }

    pub fn host_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.host_addr
            .value
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "host_addr",
                value: self.host_addr.value.clone(),
                reason: e.to_string(),
            })
    }

    /// Content environment without a bridge; callers attach one if
    /// `bridge_url` is set.
    pub fn environment(&self) -> Result<Environment, ConfigError> {
        Ok(Environment::new(
            self.origin_url()?,
            self.asset_host.value.clone(),
            self.host_socket_addr()?,
        ))
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            api_url: self.api_url.value.clone(),
            mirror_url: self.mirror_url.value.clone(),
            local_path: DEFAULT_LOCAL_PATH.to_string(),
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/esteana/
    /// - macOS: ~/Library/Application Support/esteana/
    /// - Windows: %APPDATA%/esteana/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("esteana")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/esteana/
    /// - macOS: ~/Library/Application Support/esteana/
    /// - Windows: %APPDATA%/esteana/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("esteana")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("Invalid {key} '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
