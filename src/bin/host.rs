//! Esteana native host
//!
//! Serves the bundled content under the reserved virtual hostname and
//! answers bridge requests from it.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ESTEANA_HOST_PORT`: Port to listen on (default: 8080)
//! - `ESTEANA_BUNDLE_DIR`: Web root of the content bundle (default: ~/.local/share/esteana/bundle)
//! - `ESTEANA_ASSET_HOST`: Virtual hostname to intercept (default: app.esteana.local)
//! - `ESTEANA_PUSH_TOKEN`: Token handed out for `getPushToken` (default: none)
//!
//! # Endpoints
//!
//! - `GET /__health`: Health check
//! - `GET /__bridge`: Bridge websocket
//! - `GET /*` with `Host: <asset host>`: bundled asset

use std::net::SocketAddr;
use std::path::PathBuf;

use esteana::config::DEFAULT_ASSET_HOST;
use esteana::host::{router, AssetBundle, HostServices, HostState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
struct Config {
    port: u16,
    bundle_dir: PathBuf,
    asset_host: String,
    push_token: Option<String>,
}

impl Config {
    fn from_env() -> Self {
        let port = std::env::var("ESTEANA_HOST_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let bundle_dir = std::env::var("ESTEANA_BUNDLE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("esteana")
                    .join("bundle")
            });

        let asset_host =
            std::env::var("ESTEANA_ASSET_HOST").unwrap_or_else(|_| DEFAULT_ASSET_HOST.to_string());

        let push_token = std::env::var("ESTEANA_PUSH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Self {
            port,
            bundle_dir,
            asset_host,
            push_token,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "esteana=info,esteana_host=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if !config.bundle_dir.is_dir() {
        tracing::warn!(
            "Bundle directory {} does not exist; every asset will 404",
            config.bundle_dir.display()
        );
    }
    tracing::info!("Bundle directory: {}", config.bundle_dir.display());
    tracing::info!("Asset host: {}", config.asset_host);
    if config.push_token.is_none() {
        tracing::info!("No push token configured; getPushToken replies empty");
    }

    let services = HostServices::new(AssetBundle::new(&config.bundle_dir))
        .with_push_token(config.push_token.clone());
    let app = router(HostState::new(config.asset_host.clone(), services));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Starting host on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
