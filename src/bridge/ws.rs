//! WebSocket transport for the bridge.
//!
//! Connects to the host's `/__bridge` endpoint and pumps JSON text frames
//! in both directions. When either direction fails, every pending request
//! is failed with [`BridgeError::Disconnected`].

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::client::{BridgeClient, PendingReplies};
use super::error::BridgeError;
use super::protocol::BridgeResponse;

/// Opens a bridge connection and returns a client bound to it.
pub async fn connect(url: &str) -> Result<BridgeClient, BridgeError> {
    let (ws_stream, _) = connect_async(url)
        .await
        .map_err(|e| BridgeError::Transport(e.to_string()))?;
    tracing::debug!(url, "bridge connected");

    let (mut sender, mut receiver) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let replies = Arc::new(PendingReplies::new());

    let writer_replies = replies.clone();
    tokio::spawn(async move {
        while let Some(request) = outbound_rx.recv().await {
            let frame = match serde_json::to_string(&request) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("Failed to encode bridge request: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::text(frame)).await {
                tracing::warn!("Bridge send failed: {}", e);
                break;
            }
        }
        writer_replies.close();
        let _ = sender.close().await;
    });

    let reader_replies = replies.clone();
    tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<BridgeResponse>(text.as_str()) {
                        Ok(response) => {
                            reader_replies.deliver(response);
                        }
                        Err(e) => tracing::warn!("Ignoring malformed bridge reply: {}", e),
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Bridge receive failed: {}", e);
                    break;
                }
            }
        }
        tracing::debug!("bridge reader finished");
        reader_replies.close();
    });

    Ok(BridgeClient::new(outbound_tx, replies))
}
