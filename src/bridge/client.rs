//! Content-side handle on the host bridge.
//!
//! A [`BridgeClient`] is transport-agnostic: it pushes [`BridgeRequest`]s
//! into an outbound channel and waits on a per-request oneshot for the
//! matching [`BridgeResponse`]. Whoever owns the transport (the websocket
//! pump in `ws.rs`, or the in-process host) calls
//! [`PendingReplies::deliver`] for every response that arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use tokio::sync::{mpsc, oneshot};

use super::error::BridgeError;
use super::protocol::{BridgeRequest, BridgeResponse, Operation, Outcome, RequestId};

/// Requests awaiting a reply, keyed by request id.
#[derive(Default)]
pub struct PendingReplies {
    map: Mutex<HashMap<RequestId, oneshot::Sender<BridgeResponse>>>,
    closed: AtomicBool,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, id: RequestId) -> Result<oneshot::Receiver<BridgeResponse>, BridgeError> {
        let mut map = self.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(BridgeError::Disconnected);
        }
        let (tx, rx) = oneshot::channel();
        map.insert(id, tx);
        Ok(rx)
    }

    fn forget(&self, id: RequestId) {
        self.lock().remove(&id);
    }

    /// Routes a response to its waiter. Returns false if nobody was waiting.
    pub fn deliver(&self, response: BridgeResponse) -> bool {
        let waiter = self.lock().remove(&response.id);
        match waiter {
            Some(tx) => tx.send(response).is_ok(),
            None => {
                tracing::warn!(
                    id = response.id,
                    subject = %response.subject,
                    "bridge reply with no pending request"
                );
                false
            }
        }
    }

    /// Fails every outstanding request and refuses new ones.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, oneshot::Sender<BridgeResponse>>> {
        // A poisoned map only means a waiter panicked; the entries are still valid.
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cloneable handle used by content code to reach the host.
#[derive(Clone)]
pub struct BridgeClient {
    outbound: mpsc::UnboundedSender<BridgeRequest>,
    replies: Arc<PendingReplies>,
    next_id: Arc<AtomicU64>,
}

impl BridgeClient {
    /// Wraps an outbound channel. The transport must deliver responses into
    /// `replies` and close it when the connection ends.
    pub fn new(outbound: mpsc::UnboundedSender<BridgeRequest>, replies: Arc<PendingReplies>) -> Self {
        Self {
            outbound,
            replies,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Forwards a diagnostic line to the host log. Best effort.
    pub fn log(&self, message: impl Into<String>) {
        let _ = self.send(Operation::Log {
            message: message.into(),
        });
    }

    /// Asks the host for a short haptic pulse. Best effort.
    pub fn vibrate(&self) {
        let _ = self.send(Operation::Vibrate);
    }

    /// Fetches the device push token. The host replies with an empty
    /// string when no token could be obtained.
    pub async fn push_token(&self) -> Result<String, BridgeError> {
        let response = self.call(Operation::GetPushToken).await?;
        match response.outcome {
            Outcome::Success { payload } => Ok(payload),
            Outcome::Error { reason } => Err(BridgeError::Unavailable(format!(
                "push token ({})",
                reason
            ))),
        }
    }

    /// Reads a file from the host's bundled assets.
    pub async fn load_asset(&self, path: &str) -> Result<Vec<u8>, BridgeError> {
        let response = self
            .call(Operation::LoadAsset {
                path: path.to_string(),
            })
            .await?;

        match response.outcome {
            Outcome::Success { payload } => base64::engine::general_purpose::STANDARD
                .decode(payload.as_bytes())
                .map_err(|e| BridgeError::InvalidPayload {
                    subject: response.subject,
                    reason: e.to_string(),
                }),
            Outcome::Error { reason } => Err(BridgeError::Asset {
                path: response.subject,
                reason,
            }),
        }
    }

    /// Sends a request and waits for its reply.
    pub async fn call(&self, op: Operation) -> Result<BridgeResponse, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // Register first so a fast reply cannot race past us.
        let rx = self.replies.register(id)?;

        if self.outbound.send(BridgeRequest { id, op }).is_err() {
            self.replies.forget(id);
            return Err(BridgeError::Disconnected);
        }

        rx.await.map_err(|_| BridgeError::Disconnected)
    }

    fn send(&self, op: Operation) -> Result<(), BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.outbound
            .send(BridgeRequest { id, op })
            .map_err(|_| BridgeError::Disconnected)
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("pending", &self.replies.len())
            .finish()
    }
}
