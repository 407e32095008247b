//! Removal queue and the workflow that turns it into deletions.
//!
//! The queue holds each distinct path at most once. Before anything is
//! deleted the workflow resolves a policy:
//!
//! ```text
//! Pending --RemoveAll--> Force    (delete everything, no more prompts)
//!         --AskEach----> Confirm  (yes/no per file)
//!         --Quit-------> Abort    (delete nothing)
//!         --unknown----> Pending  (ask again)
//! ```
//!
//! Each deletion is idempotent, and a parent directory emptied by a
//! deletion is removed too unless it is one of the extras roots.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::delete::{
    remove_empty_parent, remove_file_idempotent, BatchDeleteResult, DeleteConfig, DeleteError,
};
use super::prompt::Confirmer;
use crate::scanner::FileEntry;

/// A file selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalQueueEntry {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Size recorded when it was queued
    pub size: u64,
}

/// Ordered set of files pending deletion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalQueue {
    entries: Vec<RemovalQueueEntry>,
    #[serde(skip)]
    seen: HashSet<PathBuf>,
}

impl RemovalQueue {
    /// Queue a file. Returns `false` if its path is already queued.
    pub fn push(&mut self, file: &FileEntry) -> bool {
        self.push_path(file.path.clone(), file.size)
    }

    /// Queue a path directly. Returns `false` if it is already queued.
    pub fn push_path(&mut self, path: PathBuf, size: u64) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        log::trace!("Queuing {} for removal", path.display());
        self.entries.push(RemovalQueueEntry { path, size });
        true
    }

    /// Whether `path` is queued.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Number of queued files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RemovalQueueEntry> {
        self.entries.iter()
    }

    /// Sum of the recorded sizes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

impl<'a> IntoIterator for &'a RemovalQueue {
    type Item = &'a RemovalQueueEntry;
    type IntoIter = std::slice::Iter<'a, RemovalQueueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The user's answer to "what should happen to the queue?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChoice {
    /// Remove every queued file.
    RemoveAll,
    /// Ask once per file.
    AskEach,
    /// Remove nothing.
    Quit,
}

impl PolicyChoice {
    /// Parse a typed answer: `A`, `B` or `C`, case-insensitive.
    #[must_use]
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Self::RemoveAll),
            "b" => Some(Self::AskEach),
            "c" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Where the workflow is in resolving a removal policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalState {
    /// Queue populated, no policy chosen yet.
    Pending,
    /// Remove everything without further prompts.
    Force,
    /// Prompt once per file.
    Confirm,
    /// Discard the queue.
    Abort,
}

impl RemovalState {
    /// Apply an answer. Only `Pending` transitions; an unrecognized answer
    /// (`None`) leaves it `Pending`.
    #[must_use]
    pub fn resolve(self, answer: Option<PolicyChoice>) -> Self {
        match (self, answer) {
            (Self::Pending, Some(PolicyChoice::RemoveAll)) => Self::Force,
            (Self::Pending, Some(PolicyChoice::AskEach)) => Self::Confirm,
            (Self::Pending, Some(PolicyChoice::Quit)) => Self::Abort,
            (state, _) => state,
        }
    }

    /// Whether a policy still has to be chosen.
    #[must_use]
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

/// Drives a [`RemovalQueue`] through policy resolution and deletion.
#[derive(Debug, Clone)]
pub struct RemovalWorkflow {
    config: DeleteConfig,
    keep_dirs: Vec<PathBuf>,
    state: RemovalState,
}

impl RemovalWorkflow {
    /// Create a workflow. `keep_dirs` (the extras roots) are never removed
    /// as emptied parents.
    #[must_use]
    pub fn new(config: DeleteConfig, keep_dirs: Vec<PathBuf>) -> Self {
        Self {
            config,
            keep_dirs,
            state: RemovalState::Pending,
        }
    }

    /// Skip the policy question and remove everything.
    #[must_use]
    pub fn forced(mut self) -> Self {
        self.state = RemovalState::Force;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RemovalState {
        self.state
    }

    /// Resolve the policy (asking `confirmer` until it gives a usable
    /// answer) and then process the queue.
    ///
    /// # Errors
    ///
    /// - `Prompt` if the confirmer fails
    /// - `DirectoryRemoval` if an emptied parent cannot be removed
    pub fn run<C: Confirmer + ?Sized>(
        &mut self,
        queue: &RemovalQueue,
        confirmer: &mut C,
    ) -> Result<BatchDeleteResult, DeleteError> {
        let mut result = BatchDeleteResult::default();
        if queue.is_empty() {
            return Ok(result);
        }

        while self.state.is_pending() {
            let answer = confirmer.choose_policy(queue).map_err(DeleteError::Prompt)?;
            self.state = self.state.resolve(answer);
        }

        match self.state {
            RemovalState::Abort => {
                log::info!("Removal aborted, {} queued files kept", queue.len());
                result.aborted = true;
            }
            RemovalState::Force => {
                for entry in queue {
                    if !self.remove_one(&entry.path, &mut result)? {
                        break;
                    }
                }
            }
            RemovalState::Confirm => {
                for entry in queue {
                    let approved = confirmer
                        .confirm_removal(&entry.path)
                        .map_err(DeleteError::Prompt)?;
                    if !approved {
                        log::debug!("Keeping {}", entry.path.display());
                        result.skipped.push(entry.path.clone());
                        continue;
                    }
                    if !self.remove_one(&entry.path, &mut result)? {
                        break;
                    }
                }
            }
            RemovalState::Pending => unreachable!("policy resolved above"),
        }

        log::info!("{}", result.summary());
        Ok(result)
    }

    /// Remove one queued file. Returns whether processing should continue.
    fn remove_one(
        &self,
        path: &Path,
        result: &mut BatchDeleteResult,
    ) -> Result<bool, DeleteError> {
        match remove_file_idempotent(path, &self.config) {
            Ok(Some(deleted)) => {
                result.bytes_freed += deleted.size;
                result.successes.push(deleted);
                if let Some(dir) = remove_empty_parent(path, &self.keep_dirs)? {
                    result.removed_dirs.push(dir);
                }
                Ok(true)
            }
            Ok(None) => {
                result.already_absent.push(path.to_path_buf());
                Ok(true)
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", path.display(), e);
                result.failures.push((path.to_path_buf(), e.to_string()));
                if !self.config.continue_on_error {
                    log::info!("Stopping removal due to error (continue_on_error=false)");
                }
                Ok(self.config.continue_on_error)
            }
        }
    }
}
