//! Bundled asset access and virtual-host interception.

use std::path::{Component, Path, PathBuf};

pub const DEFAULT_DOCUMENT: &str = "index.html";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Invalid asset path: {0}")]
    InvalidPath(String),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Failed to read asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only view of the files shipped with the host.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    root: PathBuf,
}

impl AssetBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the bundle. The path is percent-decoded and
    /// must stay inside the bundle root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, AssetError> {
        let decoded = urlencoding::decode(path)
            .map_err(|_| AssetError::InvalidPath(path.to_string()))?;
        let relative = decoded.trim_start_matches('/');
        if relative.trim().is_empty() || relative.contains('\\') {
            return Err(AssetError::InvalidPath(path.to_string()));
        }

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(AssetError::InvalidPath(path.to_string())),
            }
        }
        Ok(resolved)
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let resolved = self.resolve(path)?;
        match tokio::fs::read(&resolved).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(path.to_string()))
            }
            Err(source) => Err(AssetError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

pub fn content_type(path: &str) -> &'static str {
    if path.ends_with(".html") {
        "text/html"
    } else if path.ends_with(".js") {
        "application/javascript"
    } else if path.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Serves bundle files for requests addressed to the reserved hostname.
/// Requests for any other host are not intercepted.
#[derive(Debug, Clone)]
pub struct AssetInterceptor {
    host: String,
    bundle: AssetBundle,
}

impl AssetInterceptor {
    pub fn new(host: impl Into<String>, bundle: AssetBundle) -> Self {
        Self {
            host: host.into(),
            bundle,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn bundle(&self) -> &AssetBundle {
        &self.bundle
    }

    /// True if `hostname` (optionally with a port) is the reserved host.
    pub fn matches(&self, hostname: &str) -> bool {
        let name = hostname
            .rsplit_once(':')
            .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
            .map(|(name, _)| name)
            .unwrap_or(hostname);
        name.eq_ignore_ascii_case(&self.host)
    }

    /// Bundle-relative path a request maps to. `/` and the empty path map
    /// to the default document.
    pub fn asset_path(path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            DEFAULT_DOCUMENT.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Returns the file for an intercepted request, or `None` when the host
    /// does not match or the file cannot be served.
    pub async fn intercept(&self, hostname: &str, path: &str) -> Option<AssetResponse> {
        if !self.matches(hostname) {
            return None;
        }
        let asset_path = Self::asset_path(path);
        match self.bundle.read(&asset_path).await {
            Ok(body) => {
                tracing::debug!(path = %asset_path, "intercept ok");
                Some(AssetResponse {
                    content_type: content_type(&asset_path),
                    body,
                })
            }
            Err(e) => {
                tracing::debug!(path = %asset_path, "intercept failed: {}", e);
                None
            }
        }
    }
}
