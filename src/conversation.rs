//! The normalized conversation record and what the memory service receives.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SOURCE_NAME: &str = "chatwise";
pub const DEFAULT_TITLE: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    /// `user`, `assistant`, `system`, or whatever the export wrote.
    pub role: String,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One exported chat session after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// Never empty: conversations without text are rejected by the parser.
    pub messages: Vec<ConversationMessage>,
    pub model: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Thread id under which this conversation lives in the memory service.
    pub fn thread_id(&self) -> String {
        format!("{}-{}", SOURCE_NAME, self.id)
    }

    pub fn first_message(&self) -> Option<&ConversationMessage> {
        self.messages.first()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }

    /// Build the create-endpoint body. `import_date` is passed in so the
    /// record itself stays free of wall-clock state.
    pub fn to_payload(&self, import_date: DateTime<Utc>) -> ThreadPayload {
        ThreadPayload {
            thread_id: self.thread_id(),
            title: self.title.clone(),
            messages: self
                .messages
                .iter()
                .map(|m| PayloadMessage {
                    content: m.text.clone(),
                    role: m.role.clone(),
                })
                .collect(),
            source: SOURCE_NAME.to_string(),
            import_date: import_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            metadata: PayloadMetadata {
                original_id: self.id.clone(),
                model: self.model.clone(),
                created_at: self.created_at.map(rfc3339),
                updated_at: self.updated_at.map(rfc3339),
                fingerprint: self.fingerprint().content,
            },
        }
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ── Fingerprint ───────────────────────────────────────────────────────────────

/// The values a record is matched on against remote threads.
///
/// `thread_key` is the deterministic thread id; `content` is the lowercase hex
/// SHA-256 of the normalized title, a newline, and the first message text.
/// Either one matching exactly makes the record a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub thread_key: String,
    pub content: String,
}

impl Fingerprint {
    pub fn of(conversation: &Conversation) -> Self {
        let first = conversation
            .first_message()
            .map(|m| m.text.as_str())
            .unwrap_or_default();
        Self {
            thread_key: conversation.thread_id(),
            content: content_hash(&conversation.title, first),
        }
    }
}

/// Trim, lowercase and collapse whitespace runs to a single space.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn content_hash(title: &str, first_message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_title(title).as_bytes());
    hasher.update(b"\n");
    hasher.update(first_message.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ── Wire payload ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadPayload {
    pub thread_id: String,
    pub title: String,
    pub messages: Vec<PayloadMessage>,
    pub source: String,
    pub import_date: String,
    pub metadata: PayloadMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMessage {
    pub content: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    pub original_id: String,
    pub model: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub fingerprint: String,
}
