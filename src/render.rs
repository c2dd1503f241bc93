//! What the user sees on the terminal besides the progress bar.

use crate::conversation::Conversation;
use crate::importer::ImportSummary;
use crate::utils::{format_date, format_timestamp, preview, truncate_chars};
use std::io::Write;

const LIST_TITLE_WIDTH: usize = 40;
const FIRST_MESSAGE_PREVIEW: usize = 100;
const SHOWN_ERRORS: usize = 5;

/// Numbered overview of everything that was parsed.
pub fn write_record_table<W: Write>(
    writer: &mut W,
    conversations: &[Conversation],
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{:>4}  {:<width$}  {:>8}  {}",
        "#",
        "Title",
        "Messages",
        "Created",
        width = LIST_TITLE_WIDTH
    )?;
    for (i, conv) in conversations.iter().enumerate() {
        writeln!(
            writer,
            "{:>4}  {:<width$}  {:>8}  {}",
            i + 1,
            truncate_chars(&conv.title, LIST_TITLE_WIDTH),
            conv.messages.len(),
            format_date(conv.created_at),
            width = LIST_TITLE_WIDTH
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Details shown before asking whether to import one conversation.
pub fn write_record_details<W: Write>(
    writer: &mut W,
    position: usize,
    total: usize,
    conv: &Conversation,
) -> std::io::Result<()> {
    let first = conv
        .first_message()
        .map(|m| preview(&m.text, FIRST_MESSAGE_PREVIEW))
        .unwrap_or_default();

    writeln!(writer)?;
    writeln!(writer, "({}/{})", position, total)?;
    writeln!(writer, "  Title:         {}", conv.title)?;
    writeln!(writer, "  Messages:      {}", conv.messages.len())?;
    writeln!(
        writer,
        "  Model:         {}",
        conv.model.as_deref().unwrap_or("N/A")
    )?;
    writeln!(writer, "  Created:       {}", format_timestamp(conv.created_at))?;
    writeln!(writer, "  First message: {}", first)?;
    Ok(())
}

pub fn write_summary<W: Write>(writer: &mut W, summary: &ImportSummary) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "Done. {} imported, {} skipped, {} duplicate, {} failed.",
        summary.imported, summary.skipped, summary.duplicates, summary.failed
    )?;
    if summary.aborted {
        writeln!(writer, "Stopped early at your request.")?;
    }
    for failure in summary.errors.iter().take(SHOWN_ERRORS) {
        writeln!(writer, "  - {}: {}", failure.title, failure.reason)?;
    }
    if summary.errors.len() > SHOWN_ERRORS {
        writeln!(
            writer,
            "  ... and {} more error(s)",
            summary.errors.len() - SHOWN_ERRORS
        )?;
    }
    Ok(())
}
