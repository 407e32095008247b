//! Human-readable sizes and durations for reports.
//!
//! Sizes use binary (1024-based) units via the bytesize crate; durations use
//! indicatif's `HumanDuration`. The exact wording is presentation only.

use std::time::Duration;

use bytesize::ByteSize;
use indicatif::HumanDuration;

/// Format a byte count, e.g. `10 B` or `1.5 MiB`.
#[must_use]
pub fn size_str(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Format a duration, e.g. `3 seconds` or `2 minutes`.
#[must_use]
pub fn time_str(duration: Duration) -> String {
    HumanDuration(duration).to_string()
}
