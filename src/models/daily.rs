use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the daily-wisdom list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wisdom {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub source: String,
}

/// Age-group key to ordered task identifiers, as shipped in
/// `daily_actions.json`.
pub type TasksByAgeGroup = HashMap<String, Vec<String>>;
