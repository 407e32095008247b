//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Pairwise comparison with size short-circuit and cached hashes
//! - Exclusion, overlap and trash filtering of comparison operands
//! - Self-scan and cross-scan search orchestration

pub mod comparator;
pub mod filter;
pub mod finder;

pub use comparator::{Comparator, MatchKind, Signature};
pub use filter::{PathFilter, Side, DEFAULT_TRASH_DIRS};
pub use finder::{
    DupeFinder, DuplicateMatch, FinderConfig, SearchError, SearchMode, SearchRequest,
    SearchSession, SearchSummary,
};
