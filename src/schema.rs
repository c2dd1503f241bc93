//! Type definitions for the documents inside a ChatWise export.
//!
//! An export is a directory (usually shipped as a zip) laid out as:
//!
//! ```text
//! chatwise-export-verison.txt   -- optional marker, note the misspelling
//! chat-<id>.json                -- one document per conversation
//! ```
//!
//! Only the fields the importer reads are modelled; everything else in the
//! documents is ignored.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Marker file names. ChatWise writes the misspelled one.
pub const VERSION_MARKERS: [&str; 2] = ["chatwise-export-verison.txt", "chatwise-export-version.txt"];

pub const CHAT_FILE_PREFIX: &str = "chat-";
pub const CHAT_FILE_SUFFIX: &str = ".json";

/// Keys that every conversation document must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["id", "title", "messages"];

pub fn is_chat_file_name(name: &str) -> bool {
    name.len() > CHAT_FILE_PREFIX.len() + CHAT_FILE_SUFFIX.len()
        && name.starts_with(CHAT_FILE_PREFIX)
        && name.ends_with(CHAT_FILE_SUFFIX)
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// A timestamp as ChatWise writes it: an RFC 3339 string in recent exports,
/// epoch milliseconds in older ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// One `chat-*.json` document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDocument {
    /// Usually a string; older exports may write a number.
    #[serde(deserialize_with = "id_text")]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub messages: Vec<ChatMessage>,

    /// Model identifier active when the chat was last used.
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub created_at: Option<RawTimestamp>,

    #[serde(default)]
    pub updated_at: Option<RawTimestamp>,
}

/// A single turn in a chat document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,

    /// Message body. Non-text payloads (attachments, tool calls) deserialize
    /// to an empty string and are dropped later.
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: String,

    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
}

fn id_text<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "conversation id must be a string or number, got {other}"
        ))),
    }
}

fn lenient_text<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}
