//! Removal script ("rmlog") generation.
//!
//! Instead of (or before) deleting interactively, the removal queue can be
//! saved as a POSIX shell script for review and later execution.
//!
//! # Features
//!
//! * **Safety-first**: the script defaults to dry-run mode and requires a `--confirm` flag.
//! * **Robust escaping**: handles spaces, quotes and special characters in file paths.
//! * **Informative**: each removal is annotated with the protected copies it duplicates.
//! * **Same cleanup**: a parent directory emptied by a removal is removed too,
//!   unless it is an extras root, one level only.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dupemgr::output::ScriptOutput;
//!
//! let output = ScriptOutput::new(&session);
//! output.write_to(&mut std::io::stdout()).unwrap();
//! ```

use std::io::Write;
use std::path::Path;

use crate::duplicates::SearchSession;
use crate::format::size_str;

/// Formatter for removal-script output.
pub struct ScriptOutput<'a> {
    session: &'a SearchSession,
}

impl<'a> ScriptOutput<'a> {
    /// Create a script for the session's removal queue.
    #[must_use]
    pub fn new(session: &'a SearchSession) -> Self {
        Self { session }
    }

    /// Write the generated script to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let queue = &self.session.queue;

        writeln!(writer, "#!/bin/sh")?;
        writeln!(writer, "# dupemgr removal script")?;
        writeln!(
            writer,
            "# Generated on: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer, "# Protected root: {}", self.session.root.display())?;
        writeln!(writer, "#")?;
        writeln!(writer, "# WARNING: This script will PERMANENTLY DELETE files.")?;
        writeln!(writer, "# Please review carefully before executing.")?;
        writeln!(writer, "#")?;
        writeln!(writer, "# Files queued: {}", queue.len())?;
        writeln!(writer, "# Reclaimable space: {}", size_str(queue.total_bytes()))?;
        writeln!(writer)?;

        writeln!(writer, "# Default to dry-run mode for safety")?;
        writeln!(writer, "DRY_RUN=1")?;
        writeln!(writer, "if [ \"$1\" = \"--confirm\" ]; then")?;
        writeln!(writer, "    DRY_RUN=0")?;
        writeln!(writer, "fi")?;
        writeln!(writer)?;

        writeln!(writer, "if [ \"$DRY_RUN\" -eq 1 ]; then")?;
        writeln!(writer, "    echo \"DRY RUN MODE. No files will be deleted.\"")?;
        writeln!(writer, "    echo \"Run with --confirm to actually delete files.\"")?;
        writeln!(writer, "    echo")?;
        writeln!(writer, "fi")?;
        writeln!(writer)?;

        writeln!(writer, "DELETED_COUNT=0")?;
        writeln!(writer, "RECLAIMED_BYTES=0")?;
        writeln!(writer)?;

        for entry in queue {
            for m in self.session.matches.iter().filter(|m| m.extra == entry.path) {
                writeln!(writer, "# {} of {}", m.kind, escape_posix(&m.original))?;
            }

            let path_str = escape_posix(&entry.path);
            writeln!(writer, "# DELETE: {path_str}")?;
            writeln!(writer, "if [ \"$DRY_RUN\" -eq 0 ]; then")?;
            writeln!(writer, "    if [ -e {path_str} ]; then")?;
            writeln!(writer, "        rm {path_str} && \\")?;
            writeln!(writer, "        DELETED_COUNT=$((DELETED_COUNT + 1)) && \\")?;
            writeln!(
                writer,
                "        RECLAIMED_BYTES=$((RECLAIMED_BYTES + {}))",
                entry.size
            )?;
            if let Some(parent) = self.cleanup_dir(&entry.path) {
                let parent_str = escape_posix(parent);
                writeln!(writer, "        if [ -z \"$(ls -A {parent_str})\" ]; then")?;
                writeln!(writer, "            echo \"    - removing {parent_str} too\"")?;
                writeln!(writer, "            rmdir {parent_str}")?;
                writeln!(writer, "        fi")?;
            }
            writeln!(writer, "    fi")?;
            writeln!(writer, "else")?;
            writeln!(writer, "    echo \"would delete: {path_str}\"")?;
            writeln!(writer, "fi")?;
            writeln!(writer)?;
        }

        writeln!(writer, "if [ \"$DRY_RUN\" -eq 0 ]; then")?;
        writeln!(writer, "    echo \"Deletion complete. Deleted $DELETED_COUNT files.\"")?;
        writeln!(writer, "    echo \"Reclaimed $RECLAIMED_BYTES bytes.\"")?;
        writeln!(writer, "else")?;
        writeln!(writer, "    echo \"Dry run complete. No files were deleted.\"")?;
        writeln!(writer, "fi")?;

        Ok(())
    }

    /// Parent directory eligible for empty-directory cleanup.
    fn cleanup_dir<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.parent()
            .filter(|parent| !self.session.extras.iter().any(|e| e == parent))
    }
}

fn escape_posix(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Wrap in single quotes, escape single quotes as '\''
    format!("'{}'", s.replace('\'', "'\\''"))
}
