//! Host side of the bridge: executes operations requested by content.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use tokio::sync::mpsc;

use super::assets::AssetBundle;
use crate::bridge::{
    escape_html, BridgeClient, BridgeError, BridgeRequest, BridgeResponse, Operation,
    PendingReplies, RequestId, PUSH_TOKEN_SUBJECT,
};

/// Length of the pulse triggered by `vibrate`.
pub const HAPTIC_PULSE: Duration = Duration::from_millis(50);

pub trait Haptics: Send + Sync {
    fn pulse(&self, duration: Duration);
}

/// Haptics for hosts without a vibration motor: records the pulse only.
pub struct LoggedHaptics;

impl Haptics for LoggedHaptics {
    fn pulse(&self, duration: Duration) {
        tracing::info!(duration_ms = duration.as_millis() as u64, "haptic pulse");
    }
}

#[async_trait]
pub trait PushTokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, BridgeError>;
}

/// Push token fixed at startup. `None` behaves like an unavailable
/// messaging service.
pub struct StaticPushToken(pub Option<String>);

#[async_trait]
impl PushTokenProvider for StaticPushToken {
    async fn token(&self) -> Result<String, BridgeError> {
        self.0
            .clone()
            .ok_or_else(|| BridgeError::Unavailable("push messaging".into()))
    }
}

/// Device capabilities available to bridge operations.
#[derive(Clone)]
pub struct HostServices {
    pub bundle: AssetBundle,
    pub haptics: Arc<dyn Haptics>,
    pub push: Arc<dyn PushTokenProvider>,
}

impl HostServices {
    pub fn new(bundle: AssetBundle) -> Self {
        Self {
            bundle,
            haptics: Arc::new(LoggedHaptics),
            push: Arc::new(StaticPushToken(None)),
        }
    }

    pub fn with_push_token(mut self, token: Option<String>) -> Self {
        self.push = Arc::new(StaticPushToken(token));
        self
    }
}

/// Dispatches requests from one content connection.
///
/// Asset reads are queued onto a single worker so they complete in request
/// order and never block the dispatching task; push token lookups run
/// independently, so replies may arrive in any order.
pub struct HostBridge {
    services: HostServices,
    replies: mpsc::UnboundedSender<BridgeResponse>,
    asset_queue: mpsc::UnboundedSender<(RequestId, String)>,
}

impl HostBridge {
    pub fn new(services: HostServices, replies: mpsc::UnboundedSender<BridgeResponse>) -> Self {
        let (asset_queue, asset_rx) = mpsc::unbounded_channel();
        tokio::spawn(asset_worker(
            services.bundle.clone(),
            asset_rx,
            replies.clone(),
        ));
        Self {
            services,
            replies,
            asset_queue,
        }
    }

    pub fn dispatch(&self, request: BridgeRequest) {
        let BridgeRequest { id, op } = request;
        match op {
            Operation::Log { message } => {
                tracing::info!(target: "esteana::content", "{}", message);
            }
            Operation::Vibrate => self.services.haptics.pulse(HAPTIC_PULSE),
            Operation::GetPushToken => {
                let push = self.services.push.clone();
                let replies = self.replies.clone();
                tokio::spawn(async move {
                    let token = match push.token().await {
                        Ok(token) => escape_html(&token),
                        Err(e) => {
                            tracing::warn!("Push token unavailable: {}", e);
                            String::new()
                        }
                    };
                    let _ = replies.send(BridgeResponse::success(id, PUSH_TOKEN_SUBJECT, token));
                });
            }
            Operation::LoadAsset { path } => {
                if path.trim().is_empty() {
                    let _ = self
                        .replies
                        .send(BridgeResponse::error(id, path, "empty asset path"));
                    return;
                }
                if let Err(mpsc::error::SendError((id, path))) = self.asset_queue.send((id, path)) {
                    let _ = self
                        .replies
                        .send(BridgeResponse::error(id, path, "asset worker stopped"));
                }
            }
        }
    }
}

async fn asset_worker(
    bundle: AssetBundle,
    mut queue: mpsc::UnboundedReceiver<(RequestId, String)>,
    replies: mpsc::UnboundedSender<BridgeResponse>,
) {
    while let Some((id, path)) = queue.recv().await {
        let response = match bundle.read(&path).await {
            Ok(bytes) => BridgeResponse::success(
                id,
                path,
                base64::engine::general_purpose::STANDARD.encode(bytes),
            ),
            Err(e) => {
                tracing::warn!("loadAsset failed: {}", e);
                BridgeResponse::error(id, path, e.to_string())
            }
        };
        if replies.send(response).is_err() {
            break;
        }
    }
}

/// Runs a host bridge inside this process and returns a client wired to it.
pub fn in_process(services: HostServices) -> BridgeClient {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<BridgeRequest>();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let replies = Arc::new(PendingReplies::new());

    let host = HostBridge::new(services, reply_tx);
    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            host.dispatch(request);
        }
    });

    let pending = replies.clone();
    tokio::spawn(async move {
        while let Some(response) = reply_rx.recv().await {
            pending.deliver(response);
        }
        pending.close();
    });

    BridgeClient::new(request_tx, replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct CountingHaptics(AtomicU32);

    impl Haptics for CountingHaptics {
        fn pulse(&self, duration: Duration) {
            assert_eq!(duration, HAPTIC_PULSE);
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn bundle() -> (AssetBundle, TempDir) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("daily_actions.json"), r#"{"adult":["x"]}"#).unwrap();
        (AssetBundle::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn test_load_asset_roundtrip() {
        let (bundle, _dir) = bundle();
        let client = in_process(HostServices::new(bundle));

        let bytes = client.load_asset("daily_actions.json").await.unwrap();
        assert_eq!(bytes, br#"{"adult":["x"]}"#);
    }

    #[tokio::test]
    async fn test_missing_asset_reports_error_with_path() {
        let (bundle, _dir) = bundle();
        let client = in_process(HostServices::new(bundle));

        match client.load_asset("nope.json").await {
            Err(BridgeError::Asset { path, .. }) => assert_eq!(path, "nope.json"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            client.load_asset("  ").await,
            Err(BridgeError::Asset { .. })
        ));
    }

    #[tokio::test]
    async fn test_push_token_escaped_or_empty() {
        let (bundle, _dir) = bundle();

        let client = in_process(HostServices::new(bundle.clone()).with_push_token(Some("a<b".into())));
        assert_eq!(client.push_token().await.unwrap(), "a&lt;b");

        let client = in_process(HostServices::new(bundle));
        assert_eq!(client.push_token().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_vibrate_pulses_without_reply() {
        let (bundle, _dir) = bundle();
        let haptics = Arc::new(CountingHaptics(AtomicU32::new(0)));
        let services = HostServices {
            haptics: haptics.clone(),
            ..HostServices::new(bundle)
        };
        let client = in_process(services);

        client.vibrate();
        // A request that does reply orders us after the pulse.
        client.push_token().await.unwrap();
        assert_eq!(haptics.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_asset_loads_correlate() {
        let (bundle, dir) = bundle();
        std::fs::write(dir.path().join("a.json"), "A").unwrap();
        std::fs::write(dir.path().join("b.json"), "B").unwrap();
        let client = in_process(HostServices::new(bundle));

        let (a, b, missing) = tokio::join!(
            client.load_asset("a.json"),
            client.load_asset("b.json"),
            client.load_asset("c.json"),
        );
        assert_eq!(a.unwrap(), b"A");
        assert_eq!(b.unwrap(), b"B");
        assert!(missing.is_err());
    }
}
