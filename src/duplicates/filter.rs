//! Path-filtering policy deciding which files may take part in a comparison.
//!
//! Three lists are consulted, all as substring matches on the NFC form of
//! the path:
//!
//! - **exclusions** apply to both operands, unconditionally;
//! - **overlaps** apply only to the protected-side operand. They are the
//!   extras targets that lie inside the protected root, so searching a
//!   sub-folder of the protected tree does not match the sub-folder against
//!   itself;
//! - **trash fragments** (e.g. `.Trash`) are always excluded.

use std::path::{Path, PathBuf};

use crate::scanner::path_utils::{self, contains_fragment};

/// Default trash-can name fragments excluded from every search.
pub const DEFAULT_TRASH_DIRS: &[&str] = &[".Trash", ".local/share/Trash", "$RECYCLE.BIN"];

/// Which operand of a comparison a path is being checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The file being checked for duplication (candidate for removal).
    Extra,
    /// The baseline file in the protected tree.
    Protected,
}

/// Exclusion, overlap and trash filtering for one search.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclusions: Vec<String>,
    overlaps: Vec<String>,
    trash_dirs: Vec<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TRASH_DIRS.iter().map(|s| (*s).to_string()).collect())
    }
}

impl PathFilter {
    /// Create a filter with the given trash fragments and nothing else.
    #[must_use]
    pub fn new(trash_dirs: Vec<String>) -> Self {
        Self {
            exclusions: Vec::new(),
            overlaps: Vec::new(),
            trash_dirs,
        }
    }

    /// Exclude every path containing `path` from both sides.
    pub fn add_exclusion(&mut self, path: &Path) {
        let key = path_utils::path_key(path);
        if !self.exclusions.contains(&key) {
            log::debug!("  will avoid {}", path.display());
            self.exclusions.push(key);
        }
    }

    /// Record `extra` as an overlap if it lies inside `root`.
    ///
    /// Returns whether an overlap was recorded.
    pub fn add_overlap_if_inside(&mut self, extra: &Path, root: &Path) -> bool {
        if !extra.starts_with(root) {
            return false;
        }
        let key = path_utils::path_key(extra);
        if !self.overlaps.contains(&key) {
            log::debug!(
                "  will ignore {} portion of {}",
                extra.display(),
                root.display()
            );
            self.overlaps.push(key);
        }
        true
    }

    /// Recorded exclusions.
    #[must_use]
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Recorded overlaps.
    #[must_use]
    pub fn overlaps(&self) -> &[String] {
        &self.overlaps
    }

    /// Trash fragments in effect.
    #[must_use]
    pub fn trash_dirs(&self) -> &[String] {
        &self.trash_dirs
    }

    /// Whether `path` may be used as an operand on `side`.
    #[must_use]
    pub fn is_searchable(&self, path: &Path, side: Side) -> bool {
        if self.exclusions.iter().any(|e| contains_fragment(path, e)) {
            return false;
        }
        if side == Side::Protected && self.overlaps.iter().any(|o| contains_fragment(path, o)) {
            return false;
        }
        !self.trash_dirs.iter().any(|t| contains_fragment(path, t))
    }

    /// Whether `path` belongs to the protected tree at `root`: inside it and
    /// not inside an overlap.
    #[must_use]
    pub fn is_protected(&self, path: &Path, root: &Path) -> bool {
        path.starts_with(root) && !self.overlaps.iter().any(|o| contains_fragment(path, o))
    }

    /// Exclusions as paths, for reporting.
    #[must_use]
    pub fn exclusion_paths(&self) -> Vec<PathBuf> {
        self.exclusions.iter().map(PathBuf::from).collect()
    }

    /// Overlaps as paths, for reporting.
    #[must_use]
    pub fn overlap_paths(&self) -> Vec<PathBuf> {
        self.overlaps.iter().map(PathBuf::from).collect()
    }
}
