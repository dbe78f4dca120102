use async_trait::async_trait;

use super::loader::AssetLoader;
use super::normalize::{parse_payload, PayloadShape};
use crate::bridge::BridgeError;
use crate::models::ScriptureUnit;

/// Why a single source failed. Every variant means "try the next source".
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("bridge: {0}")]
    Bridge(#[from] BridgeError),
    #[error("unexpected payload: {0}")]
    Shape(String),
    #[error("invalid address: {0}")]
    Address(String),
}

/// One place chapters can be acquired from.
#[async_trait]
pub trait ScriptureSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches and validates a complete payload. Never writes to the store.
    async fn attempt(&self) -> Result<Vec<ScriptureUnit>, SourceError>;
}

/// A remote endpoint reached over plain HTTP(S).
pub struct RemoteSource {
    name: String,
    http: reqwest::Client,
    url: String,
    shape: PayloadShape,
}

impl RemoteSource {
    pub fn new(
        name: impl Into<String>,
        http: reqwest::Client,
        url: impl Into<String>,
        shape: PayloadShape,
    ) -> Self {
        Self {
            name: name.into(),
            http,
            url: url.into(),
            shape,
        }
    }
}

#[async_trait]
impl ScriptureSource for RemoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self) -> Result<Vec<ScriptureUnit>, SourceError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        parse_payload(&body, self.shape)
    }
}

/// The flat scripture file bundled with the content.
pub struct LocalAssetSource {
    loader: AssetLoader,
    path: String,
}

impl LocalAssetSource {
    pub fn new(loader: AssetLoader, path: impl Into<String>) -> Self {
        Self {
            loader,
            path: path.into(),
        }
    }
}

#[async_trait]
impl ScriptureSource for LocalAssetSource {
    fn name(&self) -> &str {
        self.loader.kind()
    }

    async fn attempt(&self) -> Result<Vec<ScriptureUnit>, SourceError> {
        let bytes = self.loader.fetch(&self.path).await?;
        parse_payload(&bytes, PayloadShape::Flat)
    }
}
