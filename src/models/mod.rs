mod action_log;
mod bookmark;
mod daily;
mod scripture;
mod settings;
mod theme;

pub use action_log::{day_key, iso_timestamp, ActionLogEntry};
pub use bookmark::Bookmark;
pub use daily::{TasksByAgeGroup, Wisdom};
pub use scripture::{ScriptureUnit, Verse, CHAPTER_COUNT};
pub use settings::{
    NotificationPrefs, ReadingPosition, Settings, SettingsPatch, FONT_SIZE_DEFAULT, FONT_SIZE_MAX,
    FONT_SIZE_MIN, SETTINGS_ID,
};
pub use theme::Theme;
