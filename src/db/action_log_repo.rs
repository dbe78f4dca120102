use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{day_key, ActionLogEntry};

/// Append-only journal of user actions. Only the `synced` flag is ever
/// changed after insertion, and nothing here deletes entries.
pub struct ActionLogRepository {
    store: Store,
}

#[derive(sqlx::FromRow)]
struct ActionLogRow {
    id: String,
    action_type: String,
    payload: Option<String>,
    created_at: String,
    synced: bool,
}

impl ActionLogRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Records a new unsynced action stamped with the current time.
    pub async fn append(
        &self,
        action_type: &str,
        payload: Option<JsonValue>,
    ) -> Result<ActionLogEntry, StoreError> {
        let entry = ActionLogEntry::new(action_type, payload);
        self.insert(&entry).await?;
        tracing::debug!(id = %entry.id, action_type, "action logged");
        Ok(entry)
    }

    /// Inserts a prepared entry. Fails if the id already exists.
    pub async fn insert(&self, entry: &ActionLogEntry) -> Result<(), StoreError> {
        let pool = self.store.open().await?;
        let payload = entry
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO action_log (id, action_type, payload, created_at, synced)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.action_type)
        .bind(&payload)
        .bind(entry.created_at_key())
        .bind(entry.synced)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ActionLogEntry>, StoreError> {
        let pool = self.store.open().await?;
        let row: Option<ActionLogRow> = sqlx::query_as(
            "SELECT id, action_type, payload, created_at, synced FROM action_log WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

        row.map(Self::hydrate).transpose()
    }

    pub async fn list_unsynced(&self) -> Result<Vec<ActionLogEntry>, StoreError> {
        let pool = self.store.open().await?;
        let rows: Vec<ActionLogRow> = sqlx::query_as(
            "SELECT id, action_type, payload, created_at, synced FROM action_log WHERE synced = 0",
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    /// Flags an entry as uploaded. Unknown ids are ignored: the entry may
    /// already have been pruned by a retention policy.
    pub async fn mark_synced(&self, id: Uuid) -> Result<(), StoreError> {
        let pool = self.store.open().await?;
        let result = sqlx::query("UPDATE action_log SET synced = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(%id, "mark_synced: no such entry");
        }
        Ok(())
    }

    /// Entries created on the given UTC calendar day, matched by the
    /// `YYYY-MM-DD` prefix of their creation timestamp.
    pub async fn list_for_day(&self, day: NaiveDate) -> Result<Vec<ActionLogEntry>, StoreError> {
        let pool = self.store.open().await?;
        let prefix = format!("{}%", day_key(day));
        let rows: Vec<ActionLogRow> = sqlx::query_as(
            r#"
            SELECT id, action_type, payload, created_at, synced FROM action_log
            WHERE created_at LIKE ?
            ORDER BY created_at
            "#,
        )
        .bind(&prefix)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    pub async fn list_for_today(&self) -> Result<Vec<ActionLogEntry>, StoreError> {
        self.list_for_day(Utc::now().date_naive()).await
    }

    fn hydrate(row: ActionLogRow) -> Result<ActionLogEntry, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            collection: "action_log",
            reason,
        };
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| corrupt(format!("bad id '{}': {}", row.id, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| corrupt(format!("{}: bad created_at: {}", row.id, e)))?;
        let payload: Option<JsonValue> = row
            .payload
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(ActionLogEntry {
            id,
            action_type: row.action_type,
            payload,
            created_at,
            synced: row.synced,
        })
    }
}
