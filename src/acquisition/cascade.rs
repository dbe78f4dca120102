use std::fmt;

use super::context::{Environment, ExecutionContext};
use super::normalize::PayloadShape;
use super::source::{LocalAssetSource, RemoteSource, ScriptureSource, SourceError};
use crate::bridge::BridgeClient;
use crate::db::{Store, StoreError};

pub const DEFAULT_API_URL: &str = "https://api.alquran.cloud/v1/quran/quran-uthmani";
pub const DEFAULT_MIRROR_URL: &str = "https://cdn.esteana.app/quran.json";
pub const DEFAULT_LOCAL_PATH: &str = "quran.json";

/// URLs and paths the cascade draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub mirror_url: String,
    pub local_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            local_path: DEFAULT_LOCAL_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

fn describe(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(SourceFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Scripture unavailable, every source failed ({})", describe(.failures))]
    Exhausted { failures: Vec<SourceFailure> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub source: String,
    pub chapters_written: usize,
}

/// Ordered list of sources, tried until one yields an acceptable payload.
pub struct Cascade {
    sources: Vec<Box<dyn ScriptureSource>>,
    diagnostics: Option<BridgeClient>,
}

impl Cascade {
    pub fn new(sources: Vec<Box<dyn ScriptureSource>>) -> Self {
        Self {
            sources,
            diagnostics: None,
        }
    }

    /// Mirrors every diagnostic line to the host log.
    pub fn with_diagnostics(mut self, bridge: BridgeClient) -> Self {
        self.diagnostics = Some(bridge);
        self
    }

    /// Builds the source order for the environment's execution context:
    ///
    /// - hosted: API, bundled file (bridge or virtual host), mirror
    /// - networked: API, same-origin file
    pub fn for_environment(env: &Environment, endpoints: &Endpoints) -> Result<Self, SourceError> {
        let api: Box<dyn ScriptureSource> = Box::new(RemoteSource::new(
            "api",
            env.http.clone(),
            &endpoints.api_url,
            PayloadShape::Api,
        ));
        let local: Box<dyn ScriptureSource> = Box::new(LocalAssetSource::new(
            env.asset_loader()?,
            &endpoints.local_path,
        ));

        let cascade = match env.context() {
            ExecutionContext::Hosted => {
                let mirror: Box<dyn ScriptureSource> = Box::new(RemoteSource::new(
                    "mirror",
                    env.http.clone(),
                    &endpoints.mirror_url,
                    PayloadShape::Any,
                ));
                let cascade = Cascade::new(vec![api, local, mirror]);
                match &env.bridge {
                    Some(bridge) => cascade.with_diagnostics(bridge.clone()),
                    None => cascade,
                }
            }
            ExecutionContext::Networked => Cascade::new(vec![api, local]),
        };
        Ok(cascade)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Tries each source in order and writes the first acceptable payload
    /// in one transaction. Store errors abort immediately; source errors
    /// move on to the next source. Nothing is written unless a source
    /// succeeds.
    pub async fn run(&self, store: &Store) -> Result<AcquisitionReport, AcquisitionError> {
        let mut failures = Vec::new();

        for source in &self.sources {
            self.diagnostic(&format!("acquisition: trying {}", source.name()));
            match source.attempt().await {
                Ok(units) if !units.is_empty() => {
                    let written = store.scripture().put_all(&units).await?;
                    self.diagnostic(&format!(
                        "acquisition: stored {} chapters from {}",
                        written,
                        source.name()
                    ));
                    return Ok(AcquisitionReport {
                        source: source.name().to_string(),
                        chapters_written: written,
                    });
                }
                Ok(_) => failures.push(SourceFailure {
                    source: source.name().to_string(),
                    reason: "no chapters".to_string(),
                }),
                Err(e) => {
                    tracing::warn!(source = source.name(), "acquisition source failed: {}", e);
                    if let Some(bridge) = &self.diagnostics {
                        bridge.log(format!("acquisition: {} failed: {}", source.name(), e));
                    }
                    failures.push(SourceFailure {
                        source: source.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let error = AcquisitionError::Exhausted { failures };
        self.diagnostic(&error.to_string());
        Err(error)
    }

    fn diagnostic(&self, message: &str) {
        tracing::info!("{}", message);
        if let Some(bridge) = &self.diagnostics {
            bridge.log(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_store;
    use crate::host::{router, AssetBundle, HostServices, HostState};
    use crate::models::{ScriptureUnit, Verse};
    use async_trait::async_trait;
    use axum::{http::StatusCode, routing::get, Router};
    use reqwest::Url;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    const MIRROR_PAYLOAD: &str = r#"[
        {"id": 1, "chapterNumber": 1, "verseNumber": 1, "text": "a"},
        {"id": 2, "chapterNumber": 1, "verseNumber": 2, "text": "b"},
        {"id": 3, "chapterNumber": 2, "verseNumber": 1, "text": "c"},
        {"id": 4, "chapterNumber": 114, "verseNumber": 1, "text": "d"}
    ]"#;

    #[tokio::test]
    async fn test_falls_back_to_mirror() {
        let ctx = test_store();

        let api = serve(Router::new().route(
            "/quran",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;
        let mirror = serve(Router::new().route("/quran.json", get(|| async { MIRROR_PAYLOAD }))).await;

        let empty_bundle = TempDir::new().unwrap();
        let host = serve(router(HostState::new(
            "app.esteana.local",
            HostServices::new(AssetBundle::new(empty_bundle.path())),
        )))
        .await;

        let env = Environment::new(
            Url::parse("https://app.esteana.local/").unwrap(),
            "app.esteana.local",
            host,
        );
        let endpoints = Endpoints {
            api_url: format!("http://{}/quran", api),
            mirror_url: format!("http://{}/quran.json", mirror),
            local_path: DEFAULT_LOCAL_PATH.to_string(),
        };

        let cascade = Cascade::for_environment(&env, &endpoints).unwrap();
        assert_eq!(cascade.source_names(), vec!["api", "local-http", "mirror"]);

        let report = cascade.run(&ctx.store).await.unwrap();
        assert_eq!(report.source, "mirror");
        assert_eq!(report.chapters_written, 3);
        assert_eq!(ctx.store.scripture().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_networked_order() {
        let env = Environment::new(
            Url::parse("https://esteana.app/index.html").unwrap(),
            "app.esteana.local",
            "127.0.0.1:1".parse().unwrap(),
        );
        let cascade = Cascade::for_environment(&env, &Endpoints::default()).unwrap();
        assert_eq!(cascade.source_names(), vec!["api", "local-http"]);
    }

    struct Fixed {
        name: &'static str,
        result: fn() -> Result<Vec<ScriptureUnit>, SourceError>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ScriptureSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn attempt(&self) -> Result<Vec<ScriptureUnit>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn fixed(
        name: &'static str,
        result: fn() -> Result<Vec<ScriptureUnit>, SourceError>,
        calls: Arc<AtomicU32>,
    ) -> Box<dyn ScriptureSource> {
        Box::new(Fixed {
            name,
            result,
            calls,
        })
    }

    fn one_chapter() -> Result<Vec<ScriptureUnit>, SourceError> {
        Ok(vec![
            ScriptureUnit::new(1, "الفاتحة").with_verses(vec![Verse::new(1, "x")])
        ])
    }

    fn failing() -> Result<Vec<ScriptureUnit>, SourceError> {
        Err(SourceError::Status(503))
    }

    fn nothing() -> Result<Vec<ScriptureUnit>, SourceError> {
        Ok(Vec::new())
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let ctx = test_store();
        let later_calls = Arc::new(AtomicU32::new(0));
        let cascade = Cascade::new(vec![
            fixed("first", failing, Arc::default()),
            fixed("second", one_chapter, Arc::default()),
            fixed("third", one_chapter, later_calls.clone()),
        ]);

        let report = cascade.run(&ctx.store).await.unwrap();
        assert_eq!(report.source, "second");
        assert_eq!(report.chapters_written, 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_keeps_previous_data() {
        let ctx = test_store();
        ctx.store
            .scripture()
            .put_all(&one_chapter().unwrap())
            .await
            .unwrap();

        let cascade = Cascade::new(vec![
            fixed("a", failing, Arc::default()),
            fixed("b", nothing, Arc::default()),
        ]);

        match cascade.run(&ctx.store).await {
            Err(AcquisitionError::Exhausted { failures }) => {
                let names: Vec<&str> = failures.iter().map(|f| f.source.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(ctx.store.scripture().count().await.unwrap(), 1);
    }
}
