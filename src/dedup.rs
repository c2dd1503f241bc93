//! Deciding which parsed conversations are already in the memory service.

use crate::client::{MemoryService, RemoteThread};
use crate::conversation::{Conversation, Fingerprint};
use crate::error::Result;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDecision {
    New,
    Duplicate,
}

/// Lookup set built from the threads the service already holds.
#[derive(Debug, Default)]
pub struct RemoteIndex {
    thread_ids: HashSet<String>,
    fingerprints: HashSet<String>,
    total: usize,
}

impl RemoteIndex {
    /// Query the service. Any failure is returned: importing without knowing
    /// what exists would create duplicates.
    pub fn fetch(service: &dyn MemoryService) -> Result<Self> {
        let threads = service.list_threads()?;
        let index = Self::from_threads(&threads);
        debug!(
            threads = index.total,
            fingerprints = index.fingerprints.len(),
            "built remote index"
        );
        Ok(index)
    }

    pub fn from_threads(threads: &[RemoteThread]) -> Self {
        let mut index = Self::default();
        for thread in threads {
            if !thread.id.is_empty() {
                index.thread_ids.insert(thread.id.clone());
            }
            if let Some(fp) = thread.fingerprint() {
                index.fingerprints.insert(fp.to_string());
            }
        }
        index.total = threads.len();
        index
    }

    /// Number of remote threads the index was built from.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Exact match on either the thread key or the content hash.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.thread_ids.contains(&fingerprint.thread_key)
            || self.fingerprints.contains(&fingerprint.content)
    }

    /// Record a thread created during this run, so later records with the
    /// same keys are treated as duplicates.
    pub fn insert(&mut self, fingerprint: Fingerprint) {
        self.thread_ids.insert(fingerprint.thread_key);
        self.fingerprints.insert(fingerprint.content);
        self.total += 1;
    }

    pub fn classify(&self, conversation: &Conversation) -> ImportDecision {
        if self.contains(&conversation.fingerprint()) {
            ImportDecision::Duplicate
        } else {
            ImportDecision::New
        }
    }
}

/// Pair every conversation with its decision, keeping input order.
pub fn classify_all<'a>(
    conversations: &'a [Conversation],
    index: &RemoteIndex,
) -> Vec<(&'a Conversation, ImportDecision)> {
    conversations
        .iter()
        .map(|c| (c, index.classify(c)))
        .collect()
}
