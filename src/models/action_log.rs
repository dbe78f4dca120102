use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// One journaled user action awaiting (or past) upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: Uuid,
    pub action_type: String,
    pub payload: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

impl ActionLogEntry {
    pub fn new(action_type: impl Into<String>, payload: Option<JsonValue>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action_type: action_type.into(),
            payload,
            created_at: Utc::now(),
            synced: false,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Creation time as an ISO-8601 UTC string with millisecond precision.
    /// Day queries match on the `YYYY-MM-DD` prefix of this value.
    pub fn created_at_key(&self) -> String {
        iso_timestamp(self.created_at)
    }

    pub fn created_on(&self, day: NaiveDate) -> bool {
        self.created_at_key().starts_with(&day_key(day))
    }
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `YYYY-MM-DD` key used for day-prefix matching.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_entry_is_unsynced() {
        let entry = ActionLogEntry::new("prayer", None);
        assert!(!entry.synced);
        assert_eq!(entry.action_type, "prayer");
    }

    #[test]
    fn test_created_at_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        let entry = ActionLogEntry::new("read", None).with_created_at(at);
        assert_eq!(entry.created_at_key(), "2024-01-01T09:30:00.000Z");
        assert!(entry.created_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(!entry.created_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
    }
}
