//! Pairwise file comparison.
//!
//! A file's [`Signature`] is its size plus its content hash. Hashing is the
//! expensive step, so [`Comparator::compare`] checks sizes first and never
//! hashes two files whose sizes differ. Hashes are cached on the
//! [`FileEntry`] the first time they are computed and reused afterwards;
//! a failed read is cached too and makes the file compare unequal to
//! everything.
//!
//! # Example
//!
//! ```no_run
//! use dupemgr::duplicates::{Comparator, MatchKind};
//! use dupemgr::scanner::{FileEntry, Hasher};
//! use std::path::Path;
//!
//! let comparator = Comparator::new(Hasher::new());
//! let a = FileEntry::from_path(Path::new("/incoming/photo.jpg")).unwrap();
//! let b = FileEntry::from_path(Path::new("/library/img001.jpg")).unwrap();
//! assert_eq!(comparator.compare(&a, &b), MatchKind::ContentMatch);
//! ```

use std::cell::Cell;
use std::fmt;

use serde::Serialize;

use crate::scanner::{hash_to_hex, ContentHasher, FileEntry, Hash, HashState, Hasher};

/// Outcome of comparing two files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Different size or content (or content could not be read).
    NoMatch,
    /// Same size, same content, same base name.
    Match,
    /// Same size and content, different base name.
    ContentMatch,
}

impl MatchKind {
    /// Whether the files hold the same content.
    #[must_use]
    pub fn is_match(self) -> bool {
        !matches!(self, MatchKind::NoMatch)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::NoMatch => write!(f, "no-match"),
            MatchKind::Match => write!(f, "match"),
            MatchKind::ContentMatch => write!(f, "content"),
        }
    }
}

/// Size and content hash of a file.
///
/// Two signatures only describe the same content when both hashes are
/// present; see [`Signature::same_content`].
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    /// File size in bytes
    pub size: u64,
    /// Content hash, absent if the file could not be read
    pub hash: Option<Hash>,
}

impl Signature {
    /// Whether both signatures have the same size and the same, present, hash.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.size == other.size
            && matches!((self.hash, other.hash), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hash {
            Some(hash) => write!(f, "{:>16}-{}", self.size, hash_to_hex(hash)),
            None => write!(f, "{:>16}-None", self.size),
        }
    }
}

/// Compares files through a [`ContentHasher`], caching hashes on the entries.
#[derive(Debug)]
pub struct Comparator<H: ContentHasher = Hasher> {
    hasher: H,
    hashes_computed: Cell<usize>,
    hash_failures: Cell<usize>,
}

impl<H: ContentHasher> Comparator<H> {
    /// Create a comparator hashing through `hasher`.
    #[must_use]
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            hashes_computed: Cell::new(0),
            hash_failures: Cell::new(0),
        }
    }

    /// The underlying hasher.
    #[must_use]
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Number of times file content was actually read and hashed.
    #[must_use]
    pub fn hashes_computed(&self) -> usize {
        self.hashes_computed.get()
    }

    /// Number of hash attempts that failed.
    #[must_use]
    pub fn hash_failures(&self) -> usize {
        self.hash_failures.get()
    }

    /// Content hash of `file`, computing it only if nothing is cached or
    /// `force` is set.
    pub fn hash(&self, file: &FileEntry, force: bool) -> Option<Hash> {
        let cached = file.hash_state();
        if cached.is_resolved() && !force {
            return cached.hash();
        }

        self.hashes_computed.set(self.hashes_computed.get() + 1);
        let state = match self.hasher.hash_file(&file.path) {
            Ok(hash) => HashState::Computed(hash),
            Err(e) => {
                log::debug!("Cannot hash {}: {}", file.path.display(), e);
                self.hash_failures.set(self.hash_failures.get() + 1);
                HashState::Failed
            }
        };
        file.set_hash_state(state);
        state.hash()
    }

    /// Signature of `file`, hashing it only if no hash is cached.
    pub fn signature(&self, file: &FileEntry) -> Signature {
        Signature {
            size: file.size,
            hash: self.hash(file, false),
        }
    }

    /// Signature of `file`, re-reading its content even if a hash is cached.
    pub fn signature_forced(&self, file: &FileEntry) -> Signature {
        Signature {
            size: file.size,
            hash: self.hash(file, true),
        }
    }

    /// Classify a pair of files.
    ///
    /// Sizes are compared first; neither file is hashed when they differ.
    pub fn compare(&self, a: &FileEntry, b: &FileEntry) -> MatchKind {
        if a.size != b.size {
            return MatchKind::NoMatch;
        }

        if !self.signature(a).same_content(&self.signature(b)) {
            return MatchKind::NoMatch;
        }

        if a.name == b.name {
            MatchKind::Match
        } else {
            MatchKind::ContentMatch
        }
    }
}
