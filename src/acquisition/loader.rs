use std::net::SocketAddr;

use reqwest::Url;

use super::source::SourceError;
use crate::bridge::BridgeClient;

/// Reads files that ship with the content.
///
/// Outside the shell they are ordinary same-origin URLs. Inside it they are
/// reached either through the virtual asset host or over the bridge.
#[derive(Clone)]
pub enum AssetLoader {
    Http { http: reqwest::Client, base: Url },
    Bridge(BridgeClient),
}

impl AssetLoader {
    /// Fetches paths relative to the directory of `origin`.
    pub fn same_origin(http: reqwest::Client, origin: &Url) -> Result<Self, SourceError> {
        let base = origin
            .join("./")
            .map_err(|e| SourceError::Address(format!("{}: {}", origin, e)))?;
        Ok(AssetLoader::Http { http, base })
    }

    /// Fetches from the reserved asset hostname, routed to the host's
    /// listening address instead of DNS.
    pub fn virtual_host(asset_host: &str, host_addr: SocketAddr) -> Result<Self, SourceError> {
        let base = Url::parse(&format!("http://{}/", asset_host))
            .map_err(|e| SourceError::Address(format!("{}: {}", asset_host, e)))?;
        let http = reqwest::Client::builder()
            .resolve(asset_host, host_addr)
            .build()?;
        Ok(AssetLoader::Http { http, base })
    }

    pub fn bridge(client: BridgeClient) -> Self {
        AssetLoader::Bridge(client)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AssetLoader::Http { .. } => "local-http",
            AssetLoader::Bridge(_) => "local-bridge",
        }
    }

    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        match self {
            AssetLoader::Http { http, base } => {
                let url = base
                    .join(path.trim_start_matches('/'))
                    .map_err(|e| SourceError::Address(format!("{}: {}", path, e)))?;
                let response = http.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status(status.as_u16()));
                }
                Ok(response.bytes().await?.to_vec())
            }
            AssetLoader::Bridge(client) => Ok(client.load_asset(path).await?),
        }
    }
}
