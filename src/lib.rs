//! # chatwise-to-nowledge
//!
//! A CLI tool that imports [ChatWise](https://chatwise.app) chat exports into a local
//! [Nowledge Mem](https://mem.nowledge.co) instance.
//!
//! ## What it does
//!
//! ChatWise exports conversations as a zip of `chat-<id>.json` documents. This tool
//! unpacks the archive (or reads an already-extracted folder), parses every document
//! into a normalized conversation, and asks Nowledge Mem which threads it already
//! holds. Only conversations it does not know yet are submitted.
//!
//! The export is opened **read-only**, and nothing is stored locally between runs.
//!
//! ## Deduplication
//!
//! Each conversation is imported as thread `chatwise-<id>`, and its payload carries a
//! content fingerprint (SHA-256 of the normalized title and the first message). A
//! conversation is skipped when the service already has a thread with that id or that
//! fingerprint, so re-running an import never creates duplicates.
//!
//! ## Usage
//!
//! ```sh
//! # Import everything new without asking
//! chatwise-to-nowledge ~/Downloads/chatwise-export.zip --auto
//!
//! # Step through the conversations one by one
//! chatwise-to-nowledge ~/Downloads/chatwise-export --manual
//! ```
//!
//! Preferences can be persisted in `~/.config/chatwise-to-nowledge/config.toml`.
pub mod client;
pub mod conversation;
pub mod dedup;
pub mod error;
pub mod export;
pub mod importer;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod schema;
pub mod utils;

pub use client::{MemoryService, NowledgeClient};
pub use error::{ImportError, Result};
pub use importer::ImportSummary;
pub use utils::{ImportConfig, ImportMode};
