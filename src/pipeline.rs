//! One import run from export path to printed summary.

use crate::client::MemoryService;
use crate::dedup::{ImportDecision, RemoteIndex, classify_all};
use crate::error::Result;
use crate::export::ExportSource;
use crate::importer::{ImportSummary, Importer};
use crate::parser::RecordParser;
use crate::prompt::Prompter;
use crate::render;
use crate::utils::{ImportConfig, ImportMode};
use std::io::Write;
use tracing::info;

/// The main entry point for the import logic: locate, parse, dedup, submit.
///
/// Setup and remote-query failures are returned as errors. Per-record parse
/// and submit failures only show up in the returned summary.
pub fn execute<W: Write>(
    config: &ImportConfig,
    service: &dyn MemoryService,
    prompter: &mut dyn Prompter,
    out: &mut W,
) -> Result<ImportSummary> {
    let source = ExportSource::open(&config.input)?;
    writeln!(out, "Detected {} export.", source.format())?;

    let parser = RecordParser::new(&source);
    let parsed = parser.parse_all()?;
    let unreadable = parsed.warnings.len();
    writeln!(
        out,
        "Parsed {} conversation(s), {} unreadable.",
        parsed.conversations.len(),
        unreadable
    )?;

    if parsed.conversations.is_empty() {
        writeln!(out, "No valid conversations found.")?;
        return Ok(ImportSummary {
            skipped: unreadable,
            ..Default::default()
        });
    }

    if !config.quiet {
        render::write_record_table(out, &parsed.conversations)?;
    }

    let mut index = RemoteIndex::fetch(service)?;
    writeln!(out, "Found {} existing thread(s) in Nowledge Mem.", index.len())?;

    let fresh = classify_all(&parsed.conversations, &index)
        .iter()
        .filter(|(_, decision)| *decision == ImportDecision::New)
        .count();
    writeln!(
        out,
        "{} new, {} already imported.",
        fresh,
        parsed.conversations.len() - fresh
    )?;

    let mode = match config.mode {
        Some(mode) => mode,
        None => {
            out.flush()?;
            match prompter.choose_mode()? {
                Some(mode) => mode,
                None => {
                    writeln!(out, "Cancelled.")?;
                    return Ok(ImportSummary {
                        skipped: unreadable,
                        aborted: true,
                        ..Default::default()
                    });
                }
            }
        }
    };
    info!(%mode, records = parsed.conversations.len(), fresh, "starting import");

    let importer = Importer::new(service);
    let mut summary = match mode {
        ImportMode::Auto => {
            writeln!(out, "Automatic mode: importing every new conversation.")?;
            out.flush()?;
            importer.run_auto(&parsed.conversations, &mut index, config.quiet)
        }
        ImportMode::Manual => {
            writeln!(out, "Manual mode: confirm each conversation.")?;
            importer.run_manual(&parsed.conversations, &mut index, prompter, out)?
        }
    };
    summary.skipped += unreadable;

    render::write_summary(out, &summary)?;
    Ok(summary)
}
