use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::theme::Theme;

/// Fixed key of the singleton settings document.
pub const SETTINGS_ID: &str = "profile";

pub const FONT_SIZE_MIN: u32 = 16;
pub const FONT_SIZE_MAX: u32 = 32;
pub const FONT_SIZE_DEFAULT: u32 = 22;

/// Where the reader last stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub chapter: u32,
    pub verse: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub enabled: bool,
    pub frequency_hours: u32,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_hours: 24,
        }
    }
}

/// The user's profile document.
///
/// Every field except `id` and `updated_at` is optional: the record is
/// created lazily and filled in piecemeal through [`SettingsPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_position: Option<ReadingPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationPrefs>,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            age_group: None,
            display_name: None,
            font_size: None,
            last_position: None,
            theme: None,
            birth_date: None,
            job: None,
            gender: None,
            notifications: None,
            updated_at: Utc::now(),
        }
    }

    /// Applies a merge-patch: fields present in `patch` overwrite, the rest
    /// are kept. `updated_at` is always refreshed.
    pub fn merge(self, patch: SettingsPatch) -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            age_group: patch.age_group.or(self.age_group),
            display_name: patch.display_name.or(self.display_name),
            font_size: patch.font_size.or(self.font_size),
            last_position: patch.last_position.or(self.last_position),
            theme: patch.theme.or(self.theme),
            birth_date: patch.birth_date.or(self.birth_date),
            job: patch.job.or(self.job),
            gender: patch.gender.or(self.gender),
            notifications: patch.notifications.or(self.notifications),
            updated_at: Utc::now(),
        }
    }

    /// Font size for display, clamped to the supported range.
    pub fn effective_font_size(&self) -> u32 {
        self.font_size
            .unwrap_or(FONT_SIZE_DEFAULT)
            .clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
    }

    pub fn effective_theme(&self) -> Theme {
        self.theme.unwrap_or(Theme::Light)
    }

    /// Age in whole years on `today`, if a birth date is set.
    pub fn calculated_age(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        if birth > today {
            return Some(0);
        }
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial settings update. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub last_position: Option<ReadingPosition>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub notifications: Option<NotificationPrefs>,
}

impl SettingsPatch {
    pub fn last_position(chapter: u32, verse: u32) -> Self {
        Self {
            last_position: Some(ReadingPosition { chapter, verse }),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_preserves_untouched_fields() {
        let base = Settings::new().merge(SettingsPatch {
            display_name: Some("Amina".into()),
            font_size: Some(24),
            ..Default::default()
        });

        let merged = base.merge(SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        });

        assert_eq!(merged.display_name.as_deref(), Some("Amina"));
        assert_eq!(merged.font_size, Some(24));
        assert_eq!(merged.theme, Some(Theme::Dark));
        assert_eq!(merged.id, SETTINGS_ID);
    }

    #[test]
    fn test_merge_overwrites_explicit_fields() {
        let base = Settings::new().merge(SettingsPatch::last_position(2, 5));
        let merged = base.merge(SettingsPatch::last_position(3, 1));
        assert_eq!(
            merged.last_position,
            Some(ReadingPosition {
                chapter: 3,
                verse: 1
            })
        );
    }

    #[test]
    fn test_effective_font_size_clamped() {
        let mut settings = Settings::new();
        assert_eq!(settings.effective_font_size(), FONT_SIZE_DEFAULT);

        settings.font_size = Some(8);
        assert_eq!(settings.effective_font_size(), FONT_SIZE_MIN);

        settings.font_size = Some(64);
        assert_eq!(settings.effective_font_size(), FONT_SIZE_MAX);
    }

    #[test]
    fn test_calculated_age() {
        let mut settings = Settings::new();
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(settings.calculated_age(today), None);

        settings.birth_date = NaiveDate::from_ymd_opt(2000, 6, 16);
        assert_eq!(settings.calculated_age(today), Some(24));

        settings.birth_date = NaiveDate::from_ymd_opt(2000, 6, 15);
        assert_eq!(settings.calculated_age(today), Some(25));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(SettingsPatch::default().is_empty());
        assert!(!SettingsPatch::last_position(1, 1).is_empty());
    }
}
