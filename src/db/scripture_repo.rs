use std::collections::BTreeSet;

use super::{Store, StoreError};
use crate::models::ScriptureUnit;

pub struct ScriptureRepository {
    store: Store,
}

#[derive(sqlx::FromRow)]
struct ScriptureRow {
    number: i64,
    data: String,
}

impl ScriptureRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let pool = self.store.open().await?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scripture_units")
            .fetch_one(pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.count().await? == 0)
    }

    /// All chapters ordered by chapter number.
    pub async fn list(&self) -> Result<Vec<ScriptureUnit>, StoreError> {
        let pool = self.store.open().await?;
        let rows: Vec<ScriptureRow> =
            sqlx::query_as("SELECT number, data FROM scripture_units ORDER BY number")
                .fetch_all(pool)
                .await?;

        rows.into_iter().map(Self::hydrate).collect()
    }

    pub async fn get(&self, number: u32) -> Result<Option<ScriptureUnit>, StoreError> {
        let pool = self.store.open().await?;
        let row: Option<ScriptureRow> =
            sqlx::query_as("SELECT number, data FROM scripture_units WHERE number = ?")
                .bind(i64::from(number))
                .fetch_optional(pool)
                .await?;

        row.map(Self::hydrate).transpose()
    }

    /// Upserts every chapter in a single transaction, replacing whole
    /// records. Returns how many distinct chapters were written; a repeated
    /// number keeps its last occurrence.
    pub async fn put_all(&self, units: &[ScriptureUnit]) -> Result<usize, StoreError> {
        let pool = self.store.open().await?;
        let mut tx = pool.begin().await?;

        for unit in units {
            let data = serde_json::to_string(unit)?;
            sqlx::query(
                r#"
                INSERT INTO scripture_units (number, data) VALUES (?, ?)
                ON CONFLICT(number) DO UPDATE SET data = excluded.data
                "#,
            )
            .bind(i64::from(unit.number))
            .bind(&data)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        let distinct: BTreeSet<u32> = units.iter().map(|u| u.number).collect();
        Ok(distinct.len())
    }

    fn hydrate(row: ScriptureRow) -> Result<ScriptureUnit, StoreError> {
        let unit: ScriptureUnit = serde_json::from_str(&row.data)?;
        if i64::from(unit.number) != row.number {
            return Err(StoreError::Corrupt {
                collection: "scripture_units",
                reason: format!(
                    "record keyed {} holds chapter {}",
                    row.number, unit.number
                ),
            });
        }
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::test_store;
    use crate::models::{ScriptureUnit, Verse};

    fn chapter(number: u32, verses: &[&str]) -> ScriptureUnit {
        ScriptureUnit::new(number, format!("chapter {}", number)).with_verses(
            verses
                .iter()
                .enumerate()
                .map(|(i, text)| Verse::new(i as u32 + 1, *text))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_empty_store() {
        let ctx = test_store();
        let repo = ctx.store.scripture();
        assert!(repo.is_empty().await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_counts_repeated_chapter_once() {
        let ctx = test_store();
        let repo = ctx.store.scripture();

        let written = repo
            .put_all(&[chapter(2, &["first"]), chapter(5, &["x"]), chapter(2, &["second"])])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.get(2).await.unwrap().unwrap().verses[0].text, "second");
    }

    #[tokio::test]
    async fn test_put_all_and_list_sorted() {
        let ctx = test_store();
        let repo = ctx.store.scripture();

        let written = repo
            .put_all(&[chapter(3, &["c"]), chapter(1, &["a", "b"]), chapter(2, &["x"])])
            .await
            .unwrap();
        assert_eq!(written, 3);

        let list = repo.list().await.unwrap();
        let numbers: Vec<u32> = list.iter().map(|u| u.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(repo.count().await.unwrap(), 3);

        let first = repo.get(1).await.unwrap().unwrap();
        assert_eq!(first.verses.len(), 2);
        assert_eq!(first.verses[1].text, "b");
    }

    #[tokio::test]
    async fn test_reacquisition_replaces_whole_record() {
        let ctx = test_store();
        let repo = ctx.store.scripture();

        repo.put_all(&[chapter(1, &["old-1", "old-2", "old-3"])])
            .await
            .unwrap();
        repo.put_all(&[chapter(1, &["new-1"])]).await.unwrap();

        let unit = repo.get(1).await.unwrap().unwrap();
        assert_eq!(unit.verses.len(), 1);
        assert_eq!(unit.verses[0].text, "new-1");
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
