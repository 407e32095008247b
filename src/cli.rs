//! Command-line interface definitions for dupemgr.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Find duplicates inside one tree
//! dupemgr search ~/Pictures
//!
//! # Which files in ~/Downloads already exist in ~/Pictures?
//! dupemgr search ~/Pictures ~/Downloads --output json
//!
//! # Remove them, asking first, and keep a script of what was queued
//! dupemgr remove ~/Pictures ~/Downloads --rmlog removal.sh
//!
//! # Verbose mode for debugging
//! dupemgr -vv search ~/Pictures -x ~/Pictures/tmp
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::scanner::HashAlgorithm;

/// Find duplicate files and optionally remove the extra copies.
///
/// Files under ROOT are protected: they are the baseline and are never
/// deleted. EXTRA files or directories are checked against ROOT.
#[derive(Debug, Parser)]
#[command(name = "dupemgr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to read instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report duplicates without deleting anything
    Search(SearchArgs),
    /// Report duplicates among EXTRA and remove them
    Remove(RemoveArgs),
}

/// Options shared by `search` and `remove`.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Never compare paths containing PATH (can be specified multiple times)
    #[arg(short = 'x', long = "exclude", value_name = "PATH")]
    pub exclusions: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Content digest used to compare files
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Read block size for hashing (e.g., 32KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub block_size: Option<u64>,
}

/// Arguments for the search subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Protected directory
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Files or directories to check against ROOT; without any, ROOT is
    /// searched against itself
    #[arg(value_name = "EXTRA")]
    pub extras: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the remove subcommand.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Protected directory
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Files or directories whose duplicates of ROOT files are removed
    #[arg(value_name = "EXTRA", required = true)]
    pub extras: Vec<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Remove every queued file without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Move removed files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Write a removal script for the queue to PATH before removing anything
    #[arg(long, value_name = "PATH")]
    pub rmlog: Option<PathBuf>,
}

/// Output format for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupemgr::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("32KiB").unwrap(), 32_768);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
