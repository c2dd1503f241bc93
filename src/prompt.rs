//! Asking the user what to do.

use crate::utils::ImportMode;
use std::io::{self, BufRead, Write};

/// Answer to the per-record question in manual mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Import,
    Skip,
    Abort,
}

pub trait Prompter {
    fn confirm(&mut self) -> io::Result<Decision>;

    /// `None` when the user chose to quit.
    fn choose_mode(&mut self) -> io::Result<Option<ImportMode>>;
}

/// Line-oriented prompts over any reader/writer pair.
///
/// End of input counts as "quit", so a closed stdin never imports anything
/// by default.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask until one of `choices` (or an empty line, meaning `default`) is
    /// entered. Returns `None` at end of input.
    fn ask(&mut self, question: &str, choices: &[&str], default: &str) -> io::Result<Option<String>> {
        loop {
            write!(
                self.output,
                "{} [{}] ({}): ",
                question,
                choices.join("/"),
                default
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(None);
            }
            let answer = line.trim().to_lowercase();
            if answer.is_empty() {
                return Ok(Some(default.to_string()));
            }
            if choices.contains(&answer.as_str()) {
                return Ok(Some(answer));
            }
            writeln!(self.output, "Please select one of the available options")?;
        }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self) -> io::Result<Decision> {
        let answer = self.ask("Import this conversation?", &["y", "n", "q"], "y")?;
        Ok(match answer.as_deref() {
            Some("y") => Decision::Import,
            Some("n") => Decision::Skip,
            _ => Decision::Abort,
        })
    }

    fn choose_mode(&mut self) -> io::Result<Option<ImportMode>> {
        writeln!(self.output, "Import mode:")?;
        writeln!(
            self.output,
            "  1 - manual (confirm each: y = import / n = skip / q = quit)"
        )?;
        writeln!(self.output, "  2 - automatic (import everything new)")?;
        writeln!(self.output, "  q - quit")?;
        writeln!(self.output)?;

        let answer = self.ask("Choose", &["1", "2", "q"], "1")?;
        Ok(match answer.as_deref() {
            Some("1") => Some(ImportMode::Manual),
            Some("2") => Some(ImportMode::Auto),
            _ => None,
        })
    }
}
