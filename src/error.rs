//! Error taxonomy for the import pipeline.
//!
//! Setup and remote-query errors abort the run. Parse and submit errors are
//! per-record: the pipeline records them and moves on.

use std::path::PathBuf;

pub type Result<T, E = ImportError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("failed to query existing threads: {0}")]
    RemoteQuery(String),

    #[error("failed to submit \"{title}\": {reason}")]
    Submit { title: String, reason: String },

    #[error("terminal io error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Problems with the input or configuration, detected before any work is done.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("not a zip archive or directory: {}", .0.display())]
    NotAnExport(PathBuf),

    #[error("failed to extract archive {}: {reason}", .path.display())]
    Archive { path: PathBuf, reason: String },

    #[error("not a recognized ChatWise export: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid service URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single conversation file that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}: {reason}")]
pub struct ParseError {
    pub file: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
