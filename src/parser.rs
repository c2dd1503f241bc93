//! Turning conversation documents into [`Conversation`] records.

use crate::conversation::{Conversation, ConversationMessage, DEFAULT_TITLE};
use crate::error::{ParseError, Result, SetupError};
use crate::export::{ExportFormat, ExportSource};
use crate::schema::{ChatDocument, RawTimestamp};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads the records of an opened export.
///
/// Every call to [`RecordParser::records`] lists the conversation files again
/// and parses lazily, so the sequence can be walked any number of times.
pub struct RecordParser<'a> {
    source: &'a ExportSource,
}

impl<'a> RecordParser<'a> {
    pub fn new(source: &'a ExportSource) -> Self {
        Self { source }
    }

    pub fn records(&self) -> Result<Records> {
        match self.source.format() {
            ExportFormat::ChatWise => Ok(Records {
                files: self.source.chat_files()?.into_iter(),
            }),
            ExportFormat::Unknown => {
                Err(SetupError::UnsupportedFormat(self.source.root().to_path_buf()).into())
            }
        }
    }

    /// Walk the whole sequence, logging and setting aside unreadable records.
    pub fn parse_all(&self) -> Result<ParsedExport> {
        let mut parsed = ParsedExport::default();
        for record in self.records()? {
            match record {
                Ok(conversation) => parsed.conversations.push(conversation),
                Err(e) => {
                    warn!(file = %e.file, reason = %e.reason, "skipping unreadable conversation");
                    parsed.warnings.push(e);
                }
            }
        }
        Ok(parsed)
    }
}

#[derive(Debug, Default)]
pub struct ParsedExport {
    pub conversations: Vec<Conversation>,
    pub warnings: Vec<ParseError>,
}

/// Lazy iterator over the records of one export, in file-name order.
pub struct Records {
    files: std::vec::IntoIter<PathBuf>,
}

impl Iterator for Records {
    type Item = Result<Conversation, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.files.next().map(|path| parse_chat_file(&path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

impl ExactSizeIterator for Records {}

pub fn parse_chat_file(path: &Path) -> Result<Conversation, ParseError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = fs::read(path).map_err(|e| ParseError::new(&name, e.to_string()))?;
    parse_chat_document(&name, &bytes)
}

/// Map one raw document onto a normalized record.
pub fn parse_chat_document(file: &str, bytes: &[u8]) -> Result<Conversation, ParseError> {
    let doc: ChatDocument =
        serde_json::from_slice(bytes).map_err(|e| ParseError::new(file, e.to_string()))?;

    if doc.id.trim().is_empty() {
        return Err(ParseError::new(file, "empty conversation id"));
    }

    let messages: Vec<ConversationMessage> = doc
        .messages
        .into_iter()
        .filter_map(|m| {
            let text = m.content.trim();
            if text.is_empty() {
                return None;
            }
            Some(ConversationMessage {
                role: m.role.unwrap_or_else(|| "user".to_string()),
                text: text.to_string(),
                timestamp: m.created_at.as_ref().and_then(RawTimestamp::to_utc),
            })
        })
        .collect();

    if messages.is_empty() {
        return Err(ParseError::new(file, "no messages with text"));
    }

    Ok(Conversation {
        id: doc.id,
        title: doc
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        messages,
        model: doc.model.filter(|m| !m.is_empty()),
        created_at: doc.created_at.as_ref().and_then(RawTimestamp::to_utc),
        updated_at: doc.updated_at.as_ref().and_then(RawTimestamp::to_utc),
    })
}
