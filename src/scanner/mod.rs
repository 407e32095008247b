//! Scanner module for building the in-memory file tree and hashing files.
//!
//! This module provides functionality for:
//! - Snapshotting a directory subtree into an arena-backed [`DirTree`]
//! - Depth-first, own-files-first iteration over that snapshot
//! - Content hashing (SHA-256 by default, BLAKE3 optionally)
//! - Path normalization for identity and exclusion matching
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`tree`]: Directory tree model, aggregates and iteration
//! - [`hasher`]: Streaming file hashing
//! - [`path_utils`]: Absolute/lexical path normalization and NFC keys
//!
//! # Example
//!
//! ```no_run
//! use dupemgr::scanner::{DirTree, TreeOptions};
//! use std::path::Path;
//!
//! let tree = DirTree::build(Path::new("/data"), &TreeOptions::default()).unwrap();
//! let root = tree.root_node();
//! println!("{} files, {} bytes", root.total_files, root.total_bytes);
//! for file in tree.files() {
//!     println!("{}", file.path.display());
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod tree;

use std::cell::Cell;
use std::fmt;
use std::fs::{self, Metadata};
use std::hash::{Hash as StdHash, Hasher as StdHasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;

// Re-export main types
pub use hasher::{
    hash_to_hex, short_hash, ContentHasher, Hash, HashAlgorithm, Hasher,
    DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE,
};
pub use tree::{DirId, DirNode, DirTree, FileIter, FileRef, TreeOptions};

/// Lazily computed content hash of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashState {
    /// Not hashed yet.
    #[default]
    Pending,
    /// Hash computed successfully.
    Computed(Hash),
    /// Reading the file failed; the file never compares equal.
    Failed,
}

impl HashState {
    /// The digest, if one was computed.
    #[must_use]
    pub fn hash(&self) -> Option<Hash> {
        match self {
            HashState::Computed(hash) => Some(*hash),
            HashState::Pending | HashState::Failed => None,
        }
    }

    /// Whether a hash attempt has already been made.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, HashState::Pending)
    }
}

/// Stat data captured for a file when it is first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// File size in bytes
    pub size: u64,
    /// Creation time, where the platform reports one
    pub created: Option<SystemTime>,
    /// Last modification time
    pub modified: Option<SystemTime>,
}

impl FileMeta {
    /// Extract the fields we keep from filesystem metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            created: metadata.created().ok(),
            modified: metadata.modified().ok(),
        }
    }
}

/// One regular file in a scanned tree.
///
/// The absolute, normalized `path` is the identity of the entry: equality
/// and hashing only look at it. Size and timestamps are captured once at
/// construction; the content hash is filled in lazily by the comparator
/// and reused afterwards.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute normalized path
    pub path: PathBuf,
    /// Base name
    pub name: String,
    /// Containing directory
    pub dir: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Creation time
    pub created: Option<SystemTime>,
    /// Last modification time
    pub modified: Option<SystemTime>,
    /// When this entry was recorded
    pub recorded: DateTime<Local>,
    hash: Cell<HashState>,
}

impl FileEntry {
    /// Create a file entry from an already normalized path and captured metadata.
    #[must_use]
    pub fn new(path: PathBuf, meta: FileMeta) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            name,
            dir,
            size: meta.size,
            created: meta.created,
            modified: meta.modified,
            recorded: Local::now(),
            hash: Cell::new(HashState::Pending),
        }
    }

    /// Build an entry from a raw path, resolving it and stat-ing the file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing exists at the path
    /// - `NotAFile` if the path is not a regular file
    /// - `PermissionDenied` / `Io` if it cannot be stat-ed
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let path = path_utils::absolutize(path).map_err(|e| ScanError::from_io(path, e))?;
        let metadata = fs::metadata(&path).map_err(|e| ScanError::from_io(&path, e))?;
        if !metadata.is_file() {
            return Err(ScanError::NotAFile(path));
        }
        Ok(Self::new(path, FileMeta::from_metadata(&metadata)))
    }

    /// Build an entry from a walk entry.
    ///
    /// The entry's path is taken as-is, so the walk root must already be
    /// normalized.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the entry cannot be stat-ed.
    pub fn from_dir_entry(entry: &walkdir::DirEntry) -> Result<Self, ScanError> {
        let path = entry.path().to_path_buf();
        let metadata = entry
            .metadata()
            .map_err(|e| ScanError::from_io(&path, e.into()))?;
        Ok(Self::new(path, FileMeta::from_metadata(&metadata)))
    }

    /// Current state of the lazily computed hash.
    #[must_use]
    pub fn hash_state(&self) -> HashState {
        self.hash.get()
    }

    /// The cached hash, if one has been computed.
    #[must_use]
    pub fn cached_hash(&self) -> Option<Hash> {
        self.hash.get().hash()
    }

    pub(crate) fn set_hash_state(&self, state: HashState) {
        self.hash.set(state);
    }

    /// Serializable record of this entry, the row shape a persistent index stores.
    ///
    /// `algorithm` names the digest the cached hash was computed with.
    #[must_use]
    pub fn as_record(&self, host: &str, algorithm: HashAlgorithm) -> FileRecord {
        FileRecord {
            name: self.name.clone(),
            path: self.dir.clone(),
            size: self.size,
            host: host.to_string(),
            created: self.created.map(DateTime::<Local>::from),
            modified: self.modified.map(DateTime::<Local>::from),
            tabled: self.recorded,
            hash: self.cached_hash().map(|h| hash_to_hex(&h)),
            algorithm,
        }
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileEntry {}

impl StdHash for FileEntry {
    fn hash<H: StdHasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modified = self
            .modified
            .map(|m| {
                DateTime::<Local>::from(m)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "{}, {}, mod {}, [{}]",
            self.path.display(),
            crate::format::size_str(self.size),
            modified,
            short_hash(self.cached_hash().as_ref(), 11)
        )
    }
}

/// Flat, serializable view of a [`FileEntry`].
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Base name
    pub name: String,
    /// Containing directory
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Host the file lives on
    pub host: String,
    /// Creation time
    pub created: Option<DateTime<Local>>,
    /// Last modification time
    pub modified: Option<DateTime<Local>>,
    /// When the entry was recorded
    pub tabled: DateTime<Local>,
    /// Hex digest, if computed
    pub hash: Option<String>,
    /// Digest that produced `hash`
    pub algorithm: HashAlgorithm,
}

/// Errors that can occur while building a tree or resolving targets.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The specified path is not a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
