use chrono::NaiveDate;
use tokio::sync::OnceCell;

use crate::acquisition::{AssetLoader, SourceError};
use crate::models::{day_key, Wisdom};

pub const WISDOM_ASSET: &str = "daily-wisdom.json";

/// Index into a list of `len` entries for an ISO date key. Stable across
/// runs: a 31-multiplier hash over the key's UTF-16 code units, wrapping
/// at 32 bits.
pub fn wisdom_index(date_key: &str, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let hash = date_key
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    Some(hash as usize % len)
}

pub fn wisdom_for_day<'a>(list: &'a [Wisdom], date_key: &str) -> Option<&'a Wisdom> {
    wisdom_index(date_key, list.len()).map(|i| &list[i])
}

/// The bundled wisdom list, fetched once and kept for the process.
pub struct WisdomCatalog {
    loader: AssetLoader,
    cache: OnceCell<Vec<Wisdom>>,
}

impl WisdomCatalog {
    pub fn new(loader: AssetLoader) -> Self {
        Self {
            loader,
            cache: OnceCell::new(),
        }
    }

    /// The full list. An unreachable file yields an empty list and is
    /// retried on the next call; a successful load is never refetched.
    pub async fn list(&self) -> &[Wisdom] {
        match self.cache.get_or_try_init(|| self.fetch()).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Daily wisdom unavailable: {}", e);
                &[]
            }
        }
    }

    pub async fn for_day(&self, day: NaiveDate) -> Option<Wisdom> {
        wisdom_for_day(self.list().await, &day_key(day)).cloned()
    }

    async fn fetch(&self) -> Result<Vec<Wisdom>, SourceError> {
        let bytes = self.loader.fetch(WISDOM_ASSET).await?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Shape(e.to_string()))
    }
}
