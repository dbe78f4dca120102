//! HTTP surface of the native host.
//!
//! - `GET /__health`: liveness and version
//! - `GET /__bridge`: websocket carrying bridge frames
//! - anything else: virtual-host asset interception, 404 when not intercepted

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::assets::AssetInterceptor;
use super::bridge::{HostBridge, HostServices};
use crate::bridge::{compat, BridgeResponse};

#[derive(Clone)]
pub struct HostState {
    pub interceptor: AssetInterceptor,
    pub services: HostServices,
}

impl HostState {
    pub fn new(asset_host: impl Into<String>, services: HostServices) -> Self {
        Self {
            interceptor: AssetInterceptor::new(asset_host, services.bundle.clone()),
            services,
        }
    }
}

pub fn router(state: HostState) -> Router {
    Router::new()
        .route("/__health", get(health))
        .route("/__bridge", get(bridge_socket))
        .fallback(intercept)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn intercept(State(state): State<HostState>, headers: HeaderMap, uri: Uri) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.host());

    let Some(host) = host else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.interceptor.intercept(host, uri.path()).await {
        Some(asset) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, asset.content_type),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            asset.body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn bridge_socket(ws: WebSocketUpgrade, State(state): State<HostState>) -> Response {
    ws.on_upgrade(move |socket| serve_bridge(socket, state.services))
}

async fn serve_bridge(socket: WebSocket, services: HostServices) {
    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<BridgeResponse>();
    let bridge = HostBridge::new(services, reply_tx);

    let writer = tokio::spawn(async move {
        while let Some(response) = reply_rx.recv().await {
            let frame = match serde_json::to_string(&response) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("Failed to encode bridge reply: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match compat::decode_request(text.as_str()) {
                Ok(request) => bridge.dispatch(request),
                Err(e) => tracing::warn!("Rejected bridge frame: {}", e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Bridge socket error: {}", e);
                break;
            }
        }
    }

    tracing::debug!("bridge connection closed");
    drop(bridge);
    let _ = writer.await;
}
