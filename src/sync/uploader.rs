//! Uploads unsynced action-log entries to the sync server.
//!
//! The server answers with the ids it stored; only those are flagged as
//! synced. Anything else stays queued for the next run. There is no retry
//! inside a run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::db::{Store, StoreError};
use crate::models::ActionLogEntry;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Sync not configured. Add server_url and api_key to config.")]
    NotConfigured,
    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync server answered HTTP {0}")]
    Status(u16),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadReport {
    /// Unsynced entries sent to the server
    pub attempted: usize,
    /// Entries the server acknowledged and that are now flagged
    pub synced: usize,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    entries: &'a [ActionLogEntry],
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    accepted: Vec<Uuid>,
}

pub struct ActionLogUploader {
    http: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl ActionLogUploader {
    /// Creates an uploader from config.
    ///
    /// Returns an error if sync is not configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, UploadError> {
        let server_url = config
            .server_url
            .clone()
            .ok_or(UploadError::NotConfigured)?;
        let api_key = config.api_key.clone().ok_or(UploadError::NotConfigured)?;
        Ok(Self::new(server_url, api_key))
    }

    pub fn new(server_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url,
            api_key,
        }
    }

    pub async fn upload(&self, store: &Store) -> Result<UploadReport, UploadError> {
        let log = store.action_log();
        let pending = log.list_unsynced().await?;
        if pending.is_empty() {
            return Ok(UploadReport::default());
        }

        let response = self
            .http
            .post(self.actions_url())
            .bearer_auth(&self.api_key)
            .json(&UploadRequest { entries: &pending })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }
        let body: UploadResponse = response.json().await?;

        let sent: HashSet<Uuid> = pending.iter().map(|e| e.id).collect();
        let mut synced = 0;
        for id in body.accepted.into_iter().filter(|id| sent.contains(id)) {
            log.mark_synced(id).await?;
            synced += 1;
        }

        tracing::info!(attempted = pending.len(), synced, "action log uploaded");
        Ok(UploadReport {
            attempted: pending.len(),
            synced,
        })
    }

    fn actions_url(&self) -> String {
        format!("{}/actions", self.server_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_store;
    use axum::{
        http::{header, HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    /// Accepts every entry except those with action type "reject".
    async fn actions(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            == Some("Bearer test-key");
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
        }

        let accepted: Vec<Value> = body["entries"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e["action_type"] != "reject")
                    .map(|e| e["id"].clone())
                    .collect()
            })
            .unwrap_or_default();
        Json(json!({ "accepted": accepted })).into_response()
    }

    async fn server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/actions", post(actions)))
                .await
                .unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let missing = SyncConfig {
            server_url: Some("http://localhost".into()),
            api_key: None,
        };
        assert!(matches!(
            ActionLogUploader::from_config(&missing),
            Err(UploadError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_upload_marks_only_accepted() {
        let ctx = test_store();
        let log = ctx.store.action_log();
        log.append("read_page", None).await.unwrap();
        log.append("charity", Some(json!({"amount": 5}))).await.unwrap();
        let rejected = log.append("reject", None).await.unwrap();

        let uploader = ActionLogUploader::new(server().await, "test-key".into());
        let report = uploader.upload(&ctx.store).await.unwrap();
        assert_eq!(report, UploadReport { attempted: 3, synced: 2 });

        let left = log.list_unsynced().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, rejected.id);
    }

    #[tokio::test]
    async fn test_nothing_to_upload_skips_request() {
        let ctx = test_store();
        // Unreachable server: no request must be made.
        let uploader = ActionLogUploader::new("http://127.0.0.1:1".into(), "k".into());
        assert_eq!(
            uploader.upload(&ctx.store).await.unwrap(),
            UploadReport::default()
        );
    }

    #[tokio::test]
    async fn test_rejected_key_leaves_entries_unsynced() {
        let ctx = test_store();
        ctx.store.action_log().append("a", None).await.unwrap();

        let uploader = ActionLogUploader::new(server().await, "wrong".into());
        assert!(matches!(
            uploader.upload(&ctx.store).await,
            Err(UploadError::Status(401))
        ));
        assert_eq!(ctx.store.action_log().list_unsynced().await.unwrap().len(), 1);
    }
}
