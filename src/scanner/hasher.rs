//! Streaming file hasher.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing content digests
//! of whole files in fixed-size blocks. SHA-256 is the default digest;
//! BLAKE3 can be selected through [`HashAlgorithm`].
//!
//! The [`ContentHasher`] trait is the seam the comparator hashes through.
//! Anything able to produce a digest for a path (an on-disk reader, a
//! persistent index, a test double) can stand in for [`Hasher`].
//!
//! # Example
//!
//! ```no_run
//! use dupemgr::scanner::{hash_to_hex, ContentHasher, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let hash = hasher.hash_file(Path::new("photo.jpg")).unwrap();
//! println!("{}", hash_to_hex(&hash));
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// A 32-byte content digest.
pub type Hash = [u8; 32];

/// Default read block size for streaming hashes (32 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Largest read buffer a [`Hasher`] will allocate.
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Digest used to compute file signatures.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (default)
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Produces the content digest of a file.
pub trait ContentHasher {
    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    fn hash_file(&self, path: &Path) -> Result<Hash, HashError>;
}

/// Streaming whole-file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    block_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a SHA-256 hasher reading in [`DEFAULT_BLOCK_SIZE`] blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read block size, clamped to `1..=MAX_BLOCK_SIZE`.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.clamp(1, MAX_BLOCK_SIZE);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured read block size.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than `Interrupted`.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Hash> {
        let mut buffer = vec![0u8; self.block_size];
        match self.algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                stream_blocks(&mut reader, &mut buffer, |block| hasher.update(block))?;
                let digest = hasher.finalize();
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&digest);
                Ok(hash)
            }
            HashAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                stream_blocks(&mut reader, &mut buffer, |block| {
                    hasher.update(block);
                })?;
                Ok(*hasher.finalize().as_bytes())
            }
        }
    }

    /// Hash the full content of a file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file vanished
    /// - `PermissionDenied` if it cannot be opened
    /// - `Io` for any other read failure
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let hash = self
            .hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))?;
        log::trace!("Hashed {} ({})", path.display(), self.algorithm);
        Ok(hash)
    }
}

impl ContentHasher for Hasher {
    fn hash_file(&self, path: &Path) -> Result<Hash, HashError> {
        self.full_hash(path)
    }
}

fn stream_blocks<R: Read, F: FnMut(&[u8])>(
    reader: &mut R,
    buffer: &mut [u8],
    mut update: F,
) -> io::Result<()> {
    loop {
        match reader.read(buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Render a hash as lowercase hexadecimal (64 characters).
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut out = String::with_capacity(64);
    for byte in hash {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// First and last few hex digits of a hash, for approximate visual comparison.
///
/// `chars` is the total width including the `...` separator. An absent hash
/// renders as zeros.
///
/// ```
/// use dupemgr::scanner::short_hash;
///
/// assert_eq!(short_hash(None, 11), "0000...0000");
/// ```
#[must_use]
pub fn short_hash(hash: Option<&Hash>, chars: usize) -> String {
    let each = chars.saturating_sub(3) / 2;
    match hash {
        None => format!("{}...{}", "0".repeat(each), "0".repeat(each)),
        Some(hash) => {
            let hex = hash_to_hex(hash);
            let each = each.min(hex.len());
            format!("{}...{}", &hex[..each], &hex[hex.len() - each..])
        }
    }
}
