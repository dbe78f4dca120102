use std::net::SocketAddr;

use reqwest::Url;

use super::loader::AssetLoader;
use super::source::SourceError;
use crate::bridge::BridgeClient;

/// Where the content is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Inside the native shell: served from the virtual asset host, or
    /// opened from a local file with no network origin.
    Hosted,
    /// Served from an ordinary remote origin.
    Networked,
}

impl ExecutionContext {
    pub fn detect(origin: &Url, asset_host: &str) -> Self {
        let networked_scheme = matches!(origin.scheme(), "http" | "https");
        let on_asset_host = origin
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(asset_host));

        if !networked_scheme || on_asset_host {
            ExecutionContext::Hosted
        } else {
            ExecutionContext::Networked
        }
    }
}

/// Everything the content side needs to know about its surroundings.
#[derive(Clone)]
pub struct Environment {
    pub origin: Url,
    pub asset_host: String,
    pub host_addr: SocketAddr,
    pub http: reqwest::Client,
    pub bridge: Option<BridgeClient>,
}

impl Environment {
    pub fn new(origin: Url, asset_host: impl Into<String>, host_addr: SocketAddr) -> Self {
        Self {
            origin,
            asset_host: asset_host.into(),
            host_addr,
            http: reqwest::Client::new(),
            bridge: None,
        }
    }

    pub fn with_bridge(mut self, bridge: BridgeClient) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::detect(&self.origin, &self.asset_host)
    }

    /// Loader for bundled files: the bridge when connected, the virtual
    /// host otherwise, or the page's own origin outside the shell.
    pub fn asset_loader(&self) -> Result<AssetLoader, SourceError> {
        match (self.context(), &self.bridge) {
            (ExecutionContext::Hosted, Some(bridge)) => Ok(AssetLoader::bridge(bridge.clone())),
            (ExecutionContext::Hosted, None) => {
                AssetLoader::virtual_host(&self.asset_host, self.host_addr)
            }
            (ExecutionContext::Networked, _) => {
                AssetLoader::same_origin(self.http.clone(), &self.origin)
            }
        }
    }
}
