//! JSON output formatter for search results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/library",
//!   "mode": "cross_scan",
//!   "extras": ["/incoming"],
//!   "exclusions": [],
//!   "overlaps": [],
//!   "matches": [
//!     {
//!       "extra": "/incoming/photo.jpg",
//!       "original": "/library/img001.jpg",
//!       "kind": "content_match",
//!       "size": 1024
//!     }
//!   ],
//!   "queue": ["/incoming/photo.jpg"],
//!   "summary": {
//!     "files_checked": 12,
//!     "extras_matched": 1,
//!     "extras_bytes": 1024,
//!     "originals_matched": 1,
//!     "originals_bytes": 1024,
//!     "hashes_computed": 2,
//!     "hash_failures": 0,
//!     "started_at": "2024-05-01T10:00:00+02:00",
//!     "duration_ms": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "DM000"
//!   },
//!   "removal": null
//! }
//! ```

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::actions::BatchDeleteResult;
use crate::duplicates::{DuplicateMatch, SearchMode, SearchSession};
use crate::error::ExitCode;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Extras-side files examined
    pub files_checked: usize,
    /// Distinct extras that matched
    pub extras_matched: usize,
    /// Bytes of those extras
    pub extras_bytes: u64,
    /// Protected-side matches
    pub originals_matched: usize,
    /// Bytes of those matches
    pub originals_bytes: u64,
    /// Files read and hashed
    pub hashes_computed: usize,
    /// Files that could not be hashed
    pub hash_failures: usize,
    /// When the search started
    pub started_at: DateTime<Local>,
    /// Duration of the search in milliseconds
    pub duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DM000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Protected root
    pub root: &'a PathBuf,
    /// Strategy used
    pub mode: SearchMode,
    /// Extras searched
    pub extras: &'a [PathBuf],
    /// Exclusions in effect
    pub exclusions: &'a [PathBuf],
    /// Overlaps recorded
    pub overlaps: &'a [PathBuf],
    /// Matching pairs
    pub matches: &'a [DuplicateMatch],
    /// Paths queued for removal
    pub queue: Vec<&'a PathBuf>,
    /// Summary statistics
    pub summary: JsonSummary,
    /// Outcome of the removal workflow, if it ran
    pub removal: Option<&'a BatchDeleteResult>,
}

impl<'a> JsonOutput<'a> {
    /// Create a new JSON output from a session and exit code.
    ///
    /// # Arguments
    ///
    /// * `session` - The finished search
    /// * `exit_code` - The exit code for this run
    #[must_use]
    pub fn new(session: &'a SearchSession, exit_code: ExitCode) -> Self {
        let summary = &session.summary;
        Self {
            root: &session.root,
            mode: session.mode,
            extras: &session.extras,
            exclusions: &session.exclusions,
            overlaps: &session.overlaps,
            matches: &session.matches,
            queue: session.queue.iter().map(|e| &e.path).collect(),
            summary: JsonSummary {
                files_checked: summary.files_checked,
                extras_matched: summary.extras_matched,
                extras_bytes: summary.extras_bytes,
                originals_matched: summary.originals_matched,
                originals_bytes: summary.originals_bytes,
                hashes_computed: summary.hashes_computed,
                hash_failures: summary.hash_failures,
                started_at: summary.started_at,
                duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
            removal: None,
        }
    }

    /// Attach the removal outcome.
    #[must_use]
    pub fn with_removal(mut self, removal: &'a BatchDeleteResult) -> Self {
        self.removal = Some(removal);
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The writer to output to (e.g., stdout)
    /// * `pretty` - Whether to pretty-print the output
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{DupeFinder, MatchKind, SearchRequest};
    use std::fs;
    use tempfile::TempDir;

    fn cross_scan(dir: &TempDir) -> SearchSession {
        let library = dir.path().join("library");
        let incoming = dir.path().join("incoming");
        fs::create_dir_all(&library).unwrap();
        fs::create_dir_all(&incoming).unwrap();
        fs::write(library.join("img001.jpg"), b"pixels").unwrap();
        fs::write(incoming.join("photo.jpg"), b"pixels").unwrap();

        let request = SearchRequest::new(&library)
            .with_extras(vec![incoming])
            .with_removal(true);
        DupeFinder::with_defaults().search(&request).unwrap()
    }

    #[test]
    fn test_json_shape() {
        let dir = TempDir::new().unwrap();
        let session = cross_scan(&dir);
        let output = JsonOutput::new(&session, ExitCode::Success);

        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["mode"], "cross_scan");
        assert_eq!(value["matches"][0]["kind"], "content_match");
        assert_eq!(value["matches"][0]["size"], 6);
        assert_eq!(value["queue"].as_array().unwrap().len(), 1);
        assert_eq!(value["summary"]["extras_matched"], 1);
        assert_eq!(value["summary"]["exit_code_name"], "DM000");
        assert!(value["removal"].is_null());
        assert_eq!(session.matches[0].kind, MatchKind::ContentMatch);
    }

    #[test]
    fn test_json_with_removal() {
        let dir = TempDir::new().unwrap();
        let session = cross_scan(&dir);
        let removal = BatchDeleteResult {
            bytes_freed: 6,
            ..Default::default()
        };
        let output = JsonOutput::new(&session, ExitCode::Success).with_removal(&removal);

        let mut buffer = Vec::new();
        output.write_to(&mut buffer, true).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["removal"]["bytes_freed"], 6);
        assert_eq!(value["removal"]["aborted"], false);
    }
}
