//! Human-readable report of a search.
//!
//! Each matching extras-side file is printed once, followed by the
//! protected files it matched. The report ends with the run summary and,
//! when removal was requested, the removal queue.

use std::io::Write;
use std::time::Duration;

use yansi::Paint;

use crate::duplicates::{MatchKind, SearchSession};
use crate::format::{size_str, time_str};

/// Formatter for the plain-text report.
pub struct TextOutput<'a> {
    session: &'a SearchSession,
}

impl<'a> TextOutput<'a> {
    /// Create a report for `session`.
    #[must_use]
    pub fn new(session: &'a SearchSession) -> Self {
        Self { session }
    }

    /// Write the match list, summary and queue.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for m in &self.session.matches {
            if current != Some(&m.extra) {
                current = Some(&m.extra);
                writeln!(
                    writer,
                    "{} ({})",
                    m.extra.display().bold(),
                    size_str(m.size)
                )?;
            }
            let marker = match m.kind {
                MatchKind::Match => "==",
                _ => "= ",
            };
            writeln!(writer, "    {} {}", marker, m.original.display())?;
        }
        if self.session.has_duplicates() {
            writeln!(writer)?;
        }

        for line in summary_lines(self.session) {
            writeln!(writer, "{line}")?;
        }

        if !self.session.queue.is_empty() {
            writeln!(writer, "{}", "Removal queue:".yellow().bold())?;
            for entry in &self.session.queue {
                writeln!(writer, "{} ({})", entry.path.display(), size_str(entry.size))?;
            }
        }
        Ok(())
    }
}

/// The three summary lines of a search.
#[must_use]
pub fn summary_lines(session: &SearchSession) -> [String; 3] {
    let summary = &session.summary;
    [
        format!(
            "{} extra files found (out of {} checked), consuming {}",
            summary.extras_matched,
            summary.files_checked,
            size_str(summary.extras_bytes)
        ),
        format!(
            "    and they matched {} protected files consuming {}.",
            summary.originals_matched,
            size_str(summary.originals_bytes)
        ),
        format!("    in {}", time_str(summary.duration)),
    ]
}

/// Line reported after the removal workflow.
#[must_use]
pub fn removal_line(removed: usize, elapsed: Duration) -> String {
    format!("Removed {} files in {}", removed, time_str(elapsed))
}
