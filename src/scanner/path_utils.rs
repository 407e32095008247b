//! Path normalization utilities.
//!
//! Two kinds of normalization happen here:
//!
//! - **Lexical**: paths handed to the tool are made absolute and stripped of
//!   `.`/`..` components and trailing separators, without touching the
//!   filesystem. The result is the identity of a [`FileEntry`](super::FileEntry).
//! - **Unicode**: macOS stores names in NFD while Linux and Windows usually
//!   use NFC, so the same visible name can have two byte representations.
//!   Exclusion matching compares NFC keys so both spellings match.
//!
//! # Example
//!
//! ```
//! use dupemgr::scanner::path_utils::{contains_fragment, normalize_path_str};
//! use std::path::Path;
//!
//! let nfc = "café.txt";            // é is U+00E9
//! let nfd = "cafe\u{0301}.txt";    // e + combining accent
//!
//! assert_eq!(normalize_path_str(nfc), normalize_path_str(nfd));
//! assert!(contains_fragment(Path::new("/photos/cafe\u{0301}.txt"), nfc));
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
///
/// ```
/// use dupemgr::scanner::path_utils::normalize_path_str;
///
/// let nfd = "cafe\u{0301}.txt";
/// assert_eq!(normalize_path_str(nfd), "café.txt");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Create a normalized comparison key for a path.
///
/// Invalid UTF-8 is converted lossily.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&path.to_string_lossy())
}

/// Whether `path` contains `fragment` as a substring, compared in NFC form.
///
/// ```
/// use dupemgr::scanner::path_utils::contains_fragment;
/// use std::path::Path;
///
/// assert!(contains_fragment(Path::new("/data/tmp/x.bin"), "/data/tmp"));
/// assert!(contains_fragment(Path::new("/home/u/.Trash/a"), ".Trash"));
/// assert!(!contains_fragment(Path::new("/data/x.bin"), "/data/tmp"));
/// ```
#[must_use]
pub fn contains_fragment(path: &Path, fragment: &str) -> bool {
    if fragment.is_empty() {
        return false;
    }
    path_key(path).contains(&normalize_path_str(fragment))
}

/// Lexically normalize a path: drop `.` components, resolve `..` against the
/// preceding component, and strip trailing separators.
///
/// `..` at the root stays at the root. Symlinks are not resolved.
///
/// ```
/// use dupemgr::scanner::path_utils::normalize_lexically;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_lexically(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
/// ```
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_anchor = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if at_anchor {
                    if !out.has_root() {
                        out.push("..");
                    }
                } else if out.components().next_back() == Some(Component::ParentDir) {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make a path absolute (relative to the current directory) and lexically
/// normalize it.
///
/// # Errors
///
/// Returns an error only if the path is relative and the current directory
/// cannot be determined.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_lexically(path))
    } else {
        let cwd = std::env::current_dir()?;
        Ok(normalize_lexically(&cwd.join(path)))
    }
}
