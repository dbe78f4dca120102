use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verse the user marked as having touched their heart.
///
/// Keyed by `"{chapter}-{verse}"`, so there is at most one per verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    pub added_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(chapter: u32, verse: u32, text: impl Into<String>) -> Self {
        Self {
            id: Self::key(chapter, verse),
            chapter,
            verse,
            text: text.into(),
            added_at: Utc::now(),
        }
    }

    pub fn key(chapter: u32, verse: u32) -> String {
        format!("{}-{}", chapter, verse)
    }
}
