use serde::{Deserialize, Serialize};

/// Number of chapters in the reference text.
pub const CHAPTER_COUNT: u32 = 114;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    /// Absolute verse number as reported by the source.
    pub number: u32,
    /// Position of the verse within its chapter (1-based).
    pub number_in_chapter: u32,
    pub text: String,
}

impl Verse {
    pub fn new(number_in_chapter: u32, text: impl Into<String>) -> Self {
        Self {
            number: number_in_chapter,
            number_in_chapter,
            text: text.into(),
        }
    }
}

/// One chapter with its ordered verses. Stored as a single record keyed by
/// `number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptureUnit {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub english_name: String,
    #[serde(default)]
    pub english_name_translation: String,
    #[serde(default)]
    pub revelation_type: String,
    pub verses: Vec<Verse>,
}

impl ScriptureUnit {
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            english_name: String::new(),
            english_name_translation: String::new(),
            revelation_type: String::new(),
            verses: Vec::new(),
        }
    }

    pub fn with_verses(mut self, verses: Vec<Verse>) -> Self {
        self.verses = verses;
        self
    }

    pub fn verse(&self, number_in_chapter: u32) -> Option<&Verse> {
        self.verses
            .iter()
            .find(|v| v.number_in_chapter == number_in_chapter)
    }
}
