//! The change-event shape consumed by the projector (§6, §GLOSSARY).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeEventType {
    Insert,
    Modify,
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordKey {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub seq: i64,
    #[serde(rename = "eventType")]
    pub event_type: ChangeEventType,
    pub key: RecordKey,
    pub version: i64,
    #[serde(rename = "newImage")]
    pub new_image: Option<Value>,
}
