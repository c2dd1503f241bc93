//! Submitting new conversations, either all at once or one confirmation at a time.

use crate::client::{CreatedThread, MemoryService};
use crate::conversation::Conversation;
use crate::dedup::RemoteIndex;
use crate::error::{ImportError, Result};
use crate::prompt::{Decision, Prompter};
use crate::render;
use crate::utils::{import_progress_bar, truncate_chars};
use chrono::Utc;
use std::io::Write;
use tracing::{debug, warn};

const PROGRESS_TITLE_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    pub title: String,
    pub reason: String,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Declined by the user or unreadable in the export.
    pub skipped: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub errors: Vec<SubmitFailure>,
    /// The user quit before every record was seen.
    pub aborted: bool,
}

impl ImportSummary {
    fn record_failure(&mut self, conv: &Conversation, err: ImportError) {
        let reason = match err {
            ImportError::Submit { reason, .. } => reason,
            other => other.to_string(),
        };
        self.failed += 1;
        self.errors.push(SubmitFailure {
            title: conv.title.clone(),
            reason,
        });
    }
}

pub struct Importer<'a> {
    service: &'a dyn MemoryService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a dyn MemoryService) -> Self {
        Self { service }
    }

    fn submit(&self, conv: &Conversation) -> Result<CreatedThread> {
        let created = self.service.create_thread(&conv.to_payload(Utc::now()))?;
        debug!(
            thread_id = %conv.thread_id(),
            remote_id = created.id.as_deref().unwrap_or("unknown"),
            "created thread"
        );
        Ok(created)
    }

    /// Submit every new record in order. A failed submission is recorded and
    /// the batch goes on.
    ///
    /// Each record is checked against `index` right before it is submitted,
    /// and successful submissions are added to it, so two records with the
    /// same fingerprint in one export produce a single thread.
    pub fn run_auto(
        &self,
        conversations: &[Conversation],
        index: &mut RemoteIndex,
        quiet: bool,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let bar = import_progress_bar(conversations.len() as u64, quiet);

        for conv in conversations {
            let fingerprint = conv.fingerprint();
            if index.contains(&fingerprint) {
                summary.duplicates += 1;
                bar.inc(1);
                continue;
            }

            bar.set_message(format!(
                "Importing: {}",
                truncate_chars(&conv.title, PROGRESS_TITLE_WIDTH)
            ));
            match self.submit(conv) {
                Ok(_) => {
                    summary.imported += 1;
                    index.insert(fingerprint);
                }
                Err(e) => {
                    warn!(title = %conv.title, error = %e, "submission failed");
                    bar.println(format!(
                        "Error [{}]: {}",
                        truncate_chars(&conv.title, PROGRESS_TITLE_WIDTH),
                        e
                    ));
                    summary.record_failure(conv, e);
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        summary
    }

    /// Show each new record and act on the user's answer. Duplicates are
    /// announced and passed over without asking.
    pub fn run_manual<P, W>(
        &self,
        conversations: &[Conversation],
        index: &mut RemoteIndex,
        prompter: &mut P,
        out: &mut W,
    ) -> Result<ImportSummary>
    where
        P: Prompter + ?Sized,
        W: Write,
    {
        let mut summary = ImportSummary::default();
        let total = conversations.len();

        for (i, conv) in conversations.iter().enumerate() {
            let fingerprint = conv.fingerprint();
            if index.contains(&fingerprint) {
                summary.duplicates += 1;
                writeln!(out, "\n({}/{}) {}", i + 1, total, conv.title)?;
                writeln!(out, "Already imported, skipping.")?;
                continue;
            }

            render::write_record_details(out, i + 1, total, conv)?;
            out.flush()?;

            match prompter.confirm()? {
                Decision::Abort => {
                    summary.aborted = true;
                    writeln!(out, "Leaving manual mode.")?;
                    break;
                }
                Decision::Skip => {
                    summary.skipped += 1;
                    writeln!(out, "Skipped.")?;
                }
                Decision::Import => match self.submit(conv) {
                    Ok(created) => {
                        summary.imported += 1;
                        index.insert(fingerprint);
                        writeln!(
                            out,
                            "Created thread {}",
                            created.id.as_deref().unwrap_or("(id not reported)")
                        )?;
                    }
                    Err(e) => {
                        warn!(title = %conv.title, error = %e, "submission failed");
                        writeln!(out, "Failed: {}", e)?;
                        summary.record_failure(conv, e);
                    }
                },
            }
        }

        Ok(summary)
    }
}
