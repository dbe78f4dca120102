//! Payload validation and normalization into [`ScriptureUnit`]s.
//!
//! Two shapes are understood:
//! - the remote API envelope: `{ code, data: { chapters: [...] } }`
//! - the flat list shipped as `quran.json`: `[{ id, chapterNumber, verseNumber, text }]`
//!
//! Field aliases accept the historical names (`surahs`, `ayahs`,
//! `numberInSurah`, `sura`, `aya`).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use super::source::SourceError;
use crate::models::{ScriptureUnit, Verse, CHAPTER_COUNT};

/// Status code the remote API reports on success.
pub const API_SUCCESS_CODE: i64 = 200;

/// Arabic chapter names, indexed by chapter number - 1.
pub const CHAPTER_NAMES: [&str; CHAPTER_COUNT as usize] = [
    "الفاتحة", "البقرة", "آل عمران", "النساء", "المائدة", "الأنعام", "الأعراف", "الأنفال", "التوبة", "يونس",
    "هود", "يوسف", "الرعد", "إبراهيم", "الحجر", "النحل", "الإسراء", "الكهف", "مريم", "طه",
    "الأنبياء", "الحج", "المؤمنون", "النور", "الفرقان", "الشعراء", "النمل", "القصص", "العنكبوت", "الروم",
    "لقمان", "السجدة", "الأحزاب", "سبأ", "فاطر", "يس", "الصافات", "ص", "الزمر", "غافر",
    "فصلت", "الشورى", "الزخرف", "الدخان", "الجاثية", "الأحقاف", "محمد", "الفتح", "الحجرات", "ق",
    "الذاريات", "الطور", "النجم", "القمر", "الرحمن", "الواقعة", "الحديد", "المجادلة", "الحشر", "الممتحنة",
    "الصف", "الجمعة", "المنافقون", "التغابن", "الطلاق", "التحريم", "الملك", "القلم", "الحاقة", "المعارج",
    "نوح", "الجن", "المزمل", "المدثر", "القيامة", "الإنسان", "المرسلات", "النبأ", "النازعات", "عبس",
    "التكوير", "الانفطار", "المطففين", "الانشقاق", "البروج", "الطارق", "الأعلى", "الغاشية", "الفجر", "البلد",
    "الشمس", "الليل", "الضحى", "الشرح", "التين", "العلق", "القدر", "البينة", "الزلزلة", "العاديات",
    "القارعة", "التكاثر", "العصر", "الهمزة", "الفيل", "قريش", "الماعون", "الكوثر", "الكافرون", "النصر",
    "المسد", "الإخلاص", "الفلق", "الناس",
];

/// Name for a chapter number, or a synthesized label when out of range.
pub fn chapter_name(number: u32) -> String {
    number
        .checked_sub(1)
        .and_then(|i| CHAPTER_NAMES.get(i as usize))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("سورة {}", number))
}

/// Which payload shapes a source is allowed to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Api,
    Flat,
    /// Flat when the document is an array, API envelope otherwise.
    Any,
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
pub struct ApiData {
    #[serde(default, alias = "surahs")]
    pub chapters: Vec<ApiChapter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChapter {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub english_name: String,
    #[serde(default)]
    pub english_name_translation: String,
    #[serde(default)]
    pub revelation_type: String,
    #[serde(default, alias = "ayahs")]
    pub verses: Vec<ApiVerse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVerse {
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default, alias = "numberInSurah")]
    pub number_in_chapter: Option<u32>,
    #[serde(default)]
    pub text: String,
}

impl ApiResponse {
    /// Accepts the envelope only with the success code and a non-empty
    /// chapter list in which every chapter has verses.
    pub fn into_units(self) -> Result<Vec<ScriptureUnit>, SourceError> {
        if self.code != API_SUCCESS_CODE {
            return Err(SourceError::Shape(format!("API reported code {}", self.code)));
        }
        let chapters = self.data.map(|d| d.chapters).unwrap_or_default();
        if chapters.is_empty() {
            return Err(SourceError::Shape("API returned no chapters".into()));
        }

        chapters
            .into_iter()
            .map(|chapter| {
                if !(1..=CHAPTER_COUNT).contains(&chapter.number) {
                    return Err(SourceError::Shape(format!(
                        "chapter number {} outside 1..={}",
                        chapter.number, CHAPTER_COUNT
                    )));
                }
                if chapter.verses.is_empty() {
                    return Err(SourceError::Shape(format!(
                        "chapter {} has no verses",
                        chapter.number
                    )));
                }
                let verses = chapter
                    .verses
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let in_chapter = v.number_in_chapter.unwrap_or(i as u32 + 1);
                        Verse {
                            number: v.number.unwrap_or(in_chapter),
                            number_in_chapter: in_chapter,
                            text: v.text,
                        }
                    })
                    .collect();
                Ok(ScriptureUnit {
                    number: chapter.number,
                    name: chapter.name,
                    english_name: chapter.english_name,
                    english_name_translation: chapter.english_name_translation,
                    revelation_type: chapter.revelation_type,
                    verses,
                })
            })
            .collect()
    }
}

/// One record of the flat scripture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatVerse {
    #[serde(default, alias = "sura", deserialize_with = "lenient_number")]
    pub chapter_number: Option<u32>,
    #[serde(default, alias = "aya", deserialize_with = "lenient_number")]
    pub verse_number: Option<u32>,
    #[serde(default)]
    pub text: String,
}

/// Numbers may arrive as JSON numbers or numeric strings; anything else
/// (including 0) counts as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    let number = match value {
        Some(JsonValue::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(JsonValue::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| *n > 0))
}

/// Groups flat records into chapters ordered by chapter number. Verses keep
/// their input order within each chapter; missing numbers default to 1.
pub fn regroup(flat: Vec<FlatVerse>) -> Vec<ScriptureUnit> {
    let mut chapters: BTreeMap<u32, ScriptureUnit> = BTreeMap::new();
    for record in flat {
        let chapter = record.chapter_number.unwrap_or(1);
        let verse = record.verse_number.unwrap_or(1);
        chapters
            .entry(chapter)
            .or_insert_with(|| ScriptureUnit::new(chapter, chapter_name(chapter)))
            .verses
            .push(Verse::new(verse, record.text));
    }
    chapters.into_values().collect()
}

/// Parses and validates a payload of the expected shape.
pub fn parse_payload(bytes: &[u8], shape: PayloadShape) -> Result<Vec<ScriptureUnit>, SourceError> {
    let document: JsonValue = serde_json::from_slice(bytes)
        .map_err(|e| SourceError::Shape(format!("invalid JSON: {}", e)))?;

    let shape = match shape {
        PayloadShape::Any if document.is_array() => PayloadShape::Flat,
        PayloadShape::Any => PayloadShape::Api,
        other => other,
    };

    match shape {
        PayloadShape::Flat => {
            let flat: Vec<FlatVerse> = serde_json::from_value(document)
                .map_err(|e| SourceError::Shape(format!("malformed flat payload: {}", e)))?;
            if flat.is_empty() {
                return Err(SourceError::Shape("flat payload is empty".into()));
            }
            Ok(regroup(flat))
        }
        _ => {
            let response: ApiResponse = serde_json::from_value(document)
                .map_err(|e| SourceError::Shape(format!("malformed API payload: {}", e)))?;
            response.into_units()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(records: &[(u32, u32, &str)]) -> Vec<FlatVerse> {
        records
            .iter()
            .map(|(c, v, t)| FlatVerse {
                chapter_number: Some(*c),
                verse_number: Some(*v),
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_name_table_covers_every_chapter() {
        assert_eq!(CHAPTER_NAMES.len(), 114);
        assert_eq!(chapter_name(1), "الفاتحة");
        assert_eq!(chapter_name(114), "الناس");
        assert_eq!(chapter_name(115), "سورة 115");
        assert_eq!(chapter_name(0), "سورة 0");
    }

    #[test]
    fn test_regroup_preserves_count_and_order() {
        let input = flat(&[
            (2, 1, "b1"),
            (1, 1, "a1"),
            (2, 2, "b2"),
            (1, 2, "a2"),
            (2, 3, "b3"),
        ]);
        let chapters = regroup(input.clone());

        assert_eq!(chapters.iter().map(|c| c.number).collect::<Vec<_>>(), vec![1, 2]);
        let total: usize = chapters.iter().map(|c| c.verses.len()).sum();
        assert_eq!(total, input.len());

        for chapter in &chapters {
            let expected: Vec<&str> = input
                .iter()
                .filter(|r| r.chapter_number == Some(chapter.number))
                .map(|r| r.text.as_str())
                .collect();
            let actual: Vec<&str> = chapter.verses.iter().map(|v| v.text.as_str()).collect();
            assert_eq!(actual, expected);
        }
        assert_eq!(chapters[1].name, "البقرة");
    }

    #[test]
    fn test_flat_accepts_historical_and_string_fields() {
        let payload = br#"[
            {"id": 1, "sura": "1", "aya": "1", "text": "x"},
            {"id": 2, "chapterNumber": 1, "verseNumber": 2, "text": "y"},
            {"id": 3, "sura": "bogus", "text": "z"}
        ]"#;
        let chapters = parse_payload(payload, PayloadShape::Flat).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].verses.len(), 3);
        assert_eq!(chapters[0].verses[2].number_in_chapter, 1);
    }

    #[test]
    fn test_empty_flat_rejected() {
        assert!(matches!(
            parse_payload(b"[]", PayloadShape::Flat),
            Err(SourceError::Shape(_))
        ));
    }

    #[test]
    fn test_api_envelope() {
        let payload = r#"{
            "code": 200,
            "data": {"surahs": [
                {"number": 1, "name": "الفاتحة", "englishName": "Al-Faatiha",
                 "revelationType": "Meccan",
                 "ayahs": [{"number": 1, "numberInSurah": 1, "text": "a"},
                           {"number": 2, "numberInSurah": 2, "text": "b"}]}
            ]}
        }"#
        .as_bytes();
        let chapters = parse_payload(payload, PayloadShape::Api).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].english_name, "Al-Faatiha");
        assert_eq!(chapters[0].verses[1].text, "b");
    }

    #[test]
    fn test_api_rejections() {
        let bad_code = br#"{"code": 404, "data": {"chapters": [{"number": 1, "name": "x", "verses": [{"text": "a"}]}]}}"#;
        let no_chapters = br#"{"code": 200, "data": {"chapters": []}}"#;
        let empty_chapter = br#"{"code": 200, "data": {"chapters": [{"number": 1, "name": "x", "verses": []}]}}"#;
        let not_json = b"<html>";
        let out_of_range = br#"{"code": 200, "data": {"chapters": [{"number": 0, "name": "x", "verses": [{"text": "a"}]}]}}"#;
        let past_end = br#"{"code": 200, "data": {"chapters": [{"number": 115, "name": "x", "verses": [{"text": "a"}]}]}}"#;

        for payload in [
            &bad_code[..],
            &no_chapters[..],
            &empty_chapter[..],
            &not_json[..],
            &out_of_range[..],
            &past_end[..],
        ] {
            assert!(matches!(
                parse_payload(payload, PayloadShape::Api),
                Err(SourceError::Shape(_))
            ));
        }
    }

    #[test]
    fn test_any_dispatches_on_document_kind() {
        let flat = br#"[{"chapterNumber": 3, "verseNumber": 1, "text": "c"}]"#;
        assert_eq!(parse_payload(flat, PayloadShape::Any).unwrap()[0].number, 3);

        let api = br#"{"code": 200, "data": {"chapters": [{"number": 5, "name": "x", "verses": [{"text": "a"}]}]}}"#;
        assert_eq!(parse_payload(api, PayloadShape::Any).unwrap()[0].number, 5);
    }
}
