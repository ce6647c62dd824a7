// src/ingest/types.rs

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub timestamp_ms: Option<i64>, // epoch millis; None when missing/unparseable
    pub text: String,              // raw text as collected
}

impl Message {
    pub fn new(id: impl Into<String>, timestamp_ms: Option<i64>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp_ms,
            text: text.into(),
        }
    }
}
