use chrono::{DateTime, Utc};

use super::{Store, StoreError};
use crate::models::{iso_timestamp, Bookmark};

pub struct BookmarkRepository {
    store: Store,
}

#[derive(sqlx::FromRow)]
struct BookmarkRow {
    id: String,
    chapter: i64,
    verse: i64,
    text: String,
    added_at: String,
}

impl BookmarkRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Marks a verse. Re-adding the same verse overwrites its text and
    /// timestamp; there is never more than one record per verse.
    pub async fn add(&self, chapter: u32, verse: u32, text: &str) -> Result<String, StoreError> {
        let bookmark = Bookmark::new(chapter, verse, text);
        self.put(&bookmark).await?;
        Ok(bookmark.id)
    }

    pub async fn put(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        let pool = self.store.open().await?;
        let added_at = iso_timestamp(bookmark.added_at);

        sqlx::query(
            r#"
            INSERT INTO bookmarks (id, chapter, verse, text, added_at) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET text = excluded.text, added_at = excluded.added_at
            "#,
        )
        .bind(&bookmark.id)
        .bind(i64::from(bookmark.chapter))
        .bind(i64::from(bookmark.verse))
        .bind(&bookmark.text)
        .bind(&added_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, chapter: u32, verse: u32) -> Result<(), StoreError> {
        let pool = self.store.open().await?;
        sqlx::query("DELETE FROM bookmarks WHERE id = ?")
            .bind(Bookmark::key(chapter, verse))
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn contains(&self, chapter: u32, verse: u32) -> Result<bool, StoreError> {
        let pool = self.store.open().await?;
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM bookmarks WHERE chapter = ? AND verse = ?")
                .bind(i64::from(chapter))
                .bind(i64::from(verse))
                .fetch_optional(pool)
                .await?;
        Ok(row.is_some())
    }

    /// All bookmarks, oldest first.
    pub async fn list(&self) -> Result<Vec<Bookmark>, StoreError> {
        let pool = self.store.open().await?;
        let rows: Vec<BookmarkRow> = sqlx::query_as(
            "SELECT id, chapter, verse, text, added_at FROM bookmarks ORDER BY added_at, id",
        )
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    fn hydrate(row: BookmarkRow) -> Result<Bookmark, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            collection: "bookmarks",
            reason,
        };
        let added_at = DateTime::parse_from_rfc3339(&row.added_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| corrupt(format!("{}: bad added_at: {}", row.id, e)))?;

        Ok(Bookmark {
            chapter: u32::try_from(row.chapter)
                .map_err(|_| corrupt(format!("{}: bad chapter {}", row.id, row.chapter)))?,
            verse: u32::try_from(row.verse)
                .map_err(|_| corrupt(format!("{}: bad verse {}", row.id, row.verse)))?,
            id: row.id,
            text: row.text,
            added_at,
        })
    }
}
