//! Output formatters for search results.
//!
//! This module provides different output formats for a finished search:
//! - Plain text report for humans
//! - JSON for automation and scripting
//! - A dry-run-by-default shell script for the removal queue ("rmlog")
//!
//! # Example
//!
//! ```no_run
//! use dupemgr::duplicates::{DupeFinder, SearchRequest};
//! use dupemgr::error::ExitCode;
//! use dupemgr::output::JsonOutput;
//!
//! let session = DupeFinder::with_defaults()
//!     .search(&SearchRequest::new("."))
//!     .unwrap();
//!
//! let output = JsonOutput::new(&session, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod script;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use script::ScriptOutput;
pub use text::{removal_line, summary_lines, TextOutput};
