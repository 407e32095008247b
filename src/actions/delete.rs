//! File deletion for the removal queue.
//!
//! # Overview
//!
//! - Permanent removal (default) or move to the system trash
//! - Idempotent: a file that is already gone is a no-op, not an error
//! - Single-level cleanup of a parent directory left empty by a removal
//! - Batch results with successes, failures and skipped entries
//!
//! Failures to remove an emptied parent directory are not retried; they are
//! returned as [`DeleteError::DirectoryRemoval`] and end the run.
//!
//! # Example
//!
//! ```no_run
//! use dupemgr::actions::delete::{remove_file_idempotent, DeleteConfig};
//! use std::path::Path;
//!
//! let config = DeleteConfig::permanent();
//! match remove_file_idempotent(Path::new("/incoming/photo.jpg"), &config) {
//!     Ok(Some(result)) => println!("Deleted: {}", result.path.display()),
//!     Ok(None) => println!("Already gone"),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Permission denied when attempting to delete.
    #[error("permission denied: {0} - try running with elevated privileges")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// An emptied parent directory could not be removed.
    #[error("could not remove emptied directory {path}: {source}")]
    DirectoryRemoval {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the user's answer failed.
    #[error("prompt failed: {0}")]
    Prompt(#[source] io::Error),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::DirectoryRemoval { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::Prompt(_) => None,
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Results of working through the removal queue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Queued files that were already gone.
    pub already_absent: Vec<PathBuf>,
    /// Queued files the user declined to remove.
    pub skipped: Vec<PathBuf>,
    /// Parent directories removed because they became empty.
    pub removed_dirs: Vec<PathBuf>,
    /// Whether the user aborted the whole queue.
    pub aborted: bool,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all attempted deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.aborted {
            return "Removal aborted, nothing deleted".to_string();
        }
        let freed = crate::format::size_str(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Unlink files (true) or move them to the system trash (false).
    pub permanent: bool,
    /// Continue on error (process remaining files even if some fail).
    pub continue_on_error: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            permanent: true,
            continue_on_error: true,
        }
    }
}

impl DeleteConfig {
    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self::default()
    }

    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            permanent: false,
            ..Self::default()
        }
    }

    /// Enable/disable continue on error.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

fn classify_io(path: &Path, e: io::Error) -> DeleteError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
        _ => DeleteError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Size of the file at `path`, or `None` if it no longer exists.
fn existing_size(path: &Path) -> Result<Option<u64>, DeleteError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(classify_io(path, e)),
    }
}

/// Move a single file to the system trash.
///
/// Returns `Ok(None)` if the file is already gone.
///
/// # Errors
///
/// - `PermissionDenied` if the file cannot be inspected
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<Option<DeleteResult>, DeleteError> {
    let Some(size) = existing_size(path)? else {
        log::debug!("Already absent: {}", path.display());
        return Ok(None);
    };

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("    - moving {} to the trash ({} bytes)", path.display(), size);
    Ok(Some(DeleteResult::new(path.to_path_buf(), size, false)))
}

/// Permanently delete a single file.
///
/// Returns `Ok(None)` if the file is already gone, including when it
/// disappears between the existence check and the unlink.
///
/// # Errors
///
/// - `PermissionDenied` if the file cannot be inspected
/// - `PermanentDeleteFailed` if the unlink fails for any other reason
pub fn permanent_delete(path: &Path) -> Result<Option<DeleteResult>, DeleteError> {
    let Some(size) = existing_size(path)? else {
        log::debug!("Already absent: {}", path.display());
        return Ok(None);
    };

    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("Removed by someone else: {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            log::error!("Permanent delete failed for {}: {}", path.display(), e);
            return Err(DeleteError::PermanentDeleteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    }

    log::info!("    - removing {} ({} bytes)", path.display(), size);
    Ok(Some(DeleteResult::new(path.to_path_buf(), size, true)))
}

/// Delete a file according to `config`; an absent file is `Ok(None)`.
///
/// # Errors
///
/// See [`permanent_delete`] and [`delete_to_trash`].
pub fn remove_file_idempotent(
    path: &Path,
    config: &DeleteConfig,
) -> Result<Option<DeleteResult>, DeleteError> {
    if config.permanent {
        permanent_delete(path)
    } else {
        delete_to_trash(path)
    }
}

/// Remove the directory containing `path` if it exists, is now empty, and is
/// not one of `keep`. Only that one level is checked.
///
/// Returns the removed directory, if any.
///
/// # Errors
///
/// `DirectoryRemoval` if the directory is empty but cannot be removed.
pub fn remove_empty_parent(path: &Path, keep: &[PathBuf]) -> Result<Option<PathBuf>, DeleteError> {
    let Some(parent) = path.parent() else {
        return Ok(None);
    };
    if !parent.is_dir() || keep.iter().any(|k| k == parent) {
        return Ok(None);
    }

    let mut listing = fs::read_dir(parent).map_err(|e| classify_io(parent, e))?;
    if listing.next().is_some() {
        return Ok(None);
    }

    fs::remove_dir(parent).map_err(|source| DeleteError::DirectoryRemoval {
        path: parent.to_path_buf(),
        source,
    })?;
    log::info!("    - removing {} too", parent.display());
    Ok(Some(parent.to_path_buf()))
}
