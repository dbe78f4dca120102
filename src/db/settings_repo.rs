use super::{Store, StoreError};
use crate::models::{iso_timestamp, ReadingPosition, Settings, SettingsPatch, SETTINGS_ID};

pub struct SettingsRepository {
    store: Store,
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    data: String,
}

impl SettingsRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Returns the profile, creating an empty one on first access.
    ///
    /// The create is a single `INSERT .. DO NOTHING`, so racing first reads
    /// all see the same record.
    pub async fn get(&self) -> Result<Settings, StoreError> {
        let pool = self.store.open().await?;
        let (data, updated_at) = Self::encode(&Settings::new())?;

        sqlx::query(
            "INSERT INTO settings (id, data, updated_at) VALUES (?, ?, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(SETTINGS_ID)
        .bind(&data)
        .bind(&updated_at)
        .execute(pool)
        .await?;

        let row: SettingsRow = sqlx::query_as("SELECT data FROM settings WHERE id = ?")
            .bind(SETTINGS_ID)
            .fetch_one(pool)
            .await?;
        Ok(serde_json::from_str(&row.data)?)
    }

    /// Merge-patches the profile and returns the stored result.
    ///
    /// Read-merge-write runs under the store's settings lock; the write
    /// itself is one upsert statement.
    pub async fn save(&self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        let pool = self.store.open().await?;
        let _guard = self.store.settings_lock().await;

        let row: Option<SettingsRow> = sqlx::query_as("SELECT data FROM settings WHERE id = ?")
            .bind(SETTINGS_ID)
            .fetch_optional(pool)
            .await?;

        let existing = match row {
            Some(row) => serde_json::from_str(&row.data)?,
            None => Settings::new(),
        };
        let merged = existing.merge(patch);
        let (data, updated_at) = Self::encode(&merged)?;

        sqlx::query(
            r#"
            INSERT INTO settings (id, data, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
            "#,
        )
        .bind(SETTINGS_ID)
        .bind(&data)
        .bind(&updated_at)
        .execute(pool)
        .await?;

        Ok(merged)
    }

    pub async fn save_last_position(&self, chapter: u32, verse: u32) -> Result<(), StoreError> {
        self.save(SettingsPatch::last_position(chapter, verse))
            .await
            .map(|_| ())
    }

    pub async fn last_position(&self) -> Result<Option<ReadingPosition>, StoreError> {
        Ok(self.get().await?.last_position)
    }

    fn encode(settings: &Settings) -> Result<(String, String), StoreError> {
        Ok((
            serde_json::to_string(settings)?,
            iso_timestamp(settings.updated_at),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::test_store;
    use crate::models::{NotificationPrefs, SettingsPatch, Theme};

    #[tokio::test]
    async fn test_get_creates_profile_lazily() {
        let ctx = test_store();
        let repo = ctx.store.settings();

        let settings = repo.get().await.unwrap();
        assert_eq!(settings.id, "profile");
        assert!(settings.display_name.is_none());

        let pool = ctx.store.open().await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_save_merges_fields() {
        let ctx = test_store();
        let repo = ctx.store.settings();

        repo.save(SettingsPatch {
            age_group: Some("youth".into()),
            font_size: Some(26),
            ..Default::default()
        })
        .await
        .unwrap();

        let first = repo.get().await.unwrap();

        repo.save(SettingsPatch {
            theme: Some(Theme::Sepia),
            notifications: Some(NotificationPrefs {
                enabled: false,
                frequency_hours: 12,
            }),
            ..Default::default()
        })
        .await
        .unwrap();

        let settings = repo.get().await.unwrap();
        assert_eq!(settings.age_group.as_deref(), Some("youth"));
        assert_eq!(settings.font_size, Some(26));
        assert_eq!(settings.theme, Some(Theme::Sepia));
        assert_eq!(settings.notifications.map(|n| n.frequency_hours), Some(12));
        assert!(settings.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_last_position_roundtrip() {
        let ctx = test_store();
        let repo = ctx.store.settings();

        assert!(repo.last_position().await.unwrap().is_none());

        repo.save_last_position(18, 10).await.unwrap();
        let pos = repo.last_position().await.unwrap().unwrap();
        assert_eq!((pos.chapter, pos.verse), (18, 10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_reads_share_one_profile() {
        for _ in 0..10 {
            let ctx = test_store();
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let store = ctx.store.clone();
                    tokio::spawn(async move { store.settings().get().await })
                })
                .collect();

            let mut ids = Vec::new();
            for handle in handles {
                ids.push(handle.await.unwrap().unwrap().updated_at);
            }
            assert!(ids.windows(2).all(|w| w[0] == w[1]));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_keep_every_field() {
        for _ in 0..10 {
            let ctx = test_store();
            let patches = [
                SettingsPatch {
                    age_group: Some("adult".into()),
                    ..Default::default()
                },
                SettingsPatch {
                    display_name: Some("Amal".into()),
                    ..Default::default()
                },
                SettingsPatch {
                    font_size: Some(28),
                    ..Default::default()
                },
                SettingsPatch {
                    theme: Some(Theme::Dark),
                    ..Default::default()
                },
            ];
            let handles: Vec<_> = patches
                .into_iter()
                .map(|patch| {
                    let store = ctx.store.clone();
                    tokio::spawn(async move { store.settings().save(patch).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let settings = ctx.store.settings().get().await.unwrap();
            assert_eq!(settings.age_group.as_deref(), Some("adult"));
            assert_eq!(settings.display_name.as_deref(), Some("Amal"));
            assert_eq!(settings.font_size, Some(28));
            assert_eq!(settings.theme, Some(Theme::Dark));
        }
    }

    #[tokio::test]
    async fn test_corrupt_document_surfaces_error() {
        let ctx = test_store();
        let pool = ctx.store.open().await.unwrap();
        sqlx::query("INSERT INTO settings (id, data, updated_at) VALUES ('profile', 'not json', '')")
            .execute(pool)
            .await
            .unwrap();

        let err = ctx.store.settings().get().await.unwrap_err();
        assert!(matches!(err, crate::db::StoreError::Document(_)));
    }
}
