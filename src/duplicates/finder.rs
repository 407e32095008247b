//! Search orchestration.
//!
//! # Overview
//!
//! [`DupeFinder::search`] resolves the targets of a [`SearchRequest`],
//! snapshots the protected root with [`DirTree::build`], and runs one of two
//! strategies:
//!
//! 1. **Self-scan** (no extras): every file under the root is compared with
//!    every later file in iteration order, so each unordered pair is checked
//!    once. Nothing is queued for removal.
//! 2. **Cross-scan** (one or more extras): each extras-side file (a named
//!    file, or every file under a named directory) is compared with every
//!    file of the protected tree. Matching extras are queued when removal
//!    was requested; protected files never are.
//!
//! Operands are filtered by a [`PathFilter`] before any comparison. Extras
//! that lie inside the root become overlaps, hidden from the protected side
//! for this run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::comparator::{Comparator, MatchKind};
use super::filter::{PathFilter, Side, DEFAULT_TRASH_DIRS};
use crate::actions::RemovalQueue;
use crate::progress::{ProgressCallback, PHASE_COMPARING, PHASE_SCANNING};
use crate::scanner::path_utils;
use crate::scanner::{ContentHasher, DirTree, FileEntry, Hasher, TreeOptions};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Path fragments treated as trash cans and never searched.
    pub trash_dirs: Vec<String>,
    /// Options used when snapshotting trees.
    pub tree_options: TreeOptions,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("trash_dirs", &self.trash_dirs)
            .field("tree_options", &self.tree_options)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            trash_dirs: DEFAULT_TRASH_DIRS.iter().map(|s| (*s).to_string()).collect(),
            tree_options: TreeOptions::default(),
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Replace the trash fragments.
    #[must_use]
    pub fn with_trash_dirs(mut self, trash_dirs: Vec<String>) -> Self {
        self.trash_dirs = trash_dirs;
        self
    }

    /// Set the tree options.
    #[must_use]
    pub fn with_tree_options(mut self, options: TreeOptions) -> Self {
        self.tree_options = options;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// What to search for.
///
/// Collections start empty for every request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// The protected root.
    pub root: PathBuf,
    /// Files or directories checked against the root.
    pub extras: Vec<PathBuf>,
    /// Paths never used as an operand.
    pub exclusions: Vec<PathBuf>,
    /// Queue matching extras for removal.
    pub remove: bool,
}

impl SearchRequest {
    /// Search `root` against itself.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Check these extras against the root instead.
    #[must_use]
    pub fn with_extras(mut self, extras: Vec<PathBuf>) -> Self {
        self.extras = extras;
        self
    }

    /// Never compare paths containing any of these.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: Vec<PathBuf>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Queue matching extras for removal.
    #[must_use]
    pub fn with_removal(mut self, remove: bool) -> Self {
        self.remove = remove;
        self
    }
}

/// Which strategy a search ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// The root compared against itself.
    SelfScan,
    /// Extras compared against the root.
    CrossScan,
    /// Nothing to compare (root missing or not a directory).
    Skipped,
}

/// Counters accumulated over one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    /// Extras-side files examined
    pub files_checked: usize,
    /// Distinct extras-side files that matched something
    pub extras_matched: usize,
    /// Bytes of those extras
    pub extras_bytes: u64,
    /// Protected-side matches, one per matching pair
    pub originals_matched: usize,
    /// Bytes of those matches
    pub originals_bytes: u64,
    /// Files whose content was read and hashed
    pub hashes_computed: usize,
    /// Hash attempts that failed
    pub hash_failures: usize,
    /// When the search started
    pub started_at: DateTime<Local>,
    /// When the search finished
    pub finished_at: DateTime<Local>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl SearchSummary {
    fn started() -> Self {
        let now = Local::now();
        Self {
            files_checked: 0,
            extras_matched: 0,
            extras_bytes: 0,
            originals_matched: 0,
            originals_bytes: 0,
            hashes_computed: 0,
            hash_failures: 0,
            started_at: now,
            finished_at: now,
            duration: Duration::ZERO,
        }
    }
}

/// One matching pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMatch {
    /// Extras-side file
    pub extra: PathBuf,
    /// Protected-side file with the same content
    pub original: PathBuf,
    /// Same name or content only
    pub kind: MatchKind,
    /// Shared size in bytes
    pub size: u64,
}

/// Everything one search produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
    /// Resolved protected root
    pub root: PathBuf,
    /// Extras that exist and were searched
    pub extras: Vec<PathBuf>,
    /// Exclusions in effect
    pub exclusions: Vec<PathBuf>,
    /// Extras recorded as overlapping the root
    pub overlaps: Vec<PathBuf>,
    /// Strategy used
    pub mode: SearchMode,
    /// Counters
    pub summary: SearchSummary,
    /// Matching pairs in discovery order
    pub matches: Vec<DuplicateMatch>,
    /// Extras queued for removal
    pub queue: RemovalQueue,
}

impl SearchSession {
    /// Whether any duplicate was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Errors that can end a search.
///
/// Missing targets and unreadable files are not errors; they are logged and
/// skipped.
#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    /// A relative path could not be made absolute.
    #[error("Cannot resolve {path}: {source}")]
    Resolve {
        /// Path as given
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// An extras target after resolution.
enum Target {
    File(FileEntry),
    Dir(DirTree),
}

impl Target {
    fn files(&self) -> Vec<&FileEntry> {
        match self {
            Target::File(file) => vec![file],
            Target::Dir(tree) => tree.files().collect(),
        }
    }

    fn file_count(&self) -> usize {
        match self {
            Target::File(_) => 1,
            Target::Dir(tree) => tree.root_node().total_files,
        }
    }
}

/// Duplicate finder running self-scans and cross-scans.
///
/// # Example
///
/// ```no_run
/// use dupemgr::duplicates::{DupeFinder, SearchRequest};
/// use std::path::PathBuf;
///
/// let finder = DupeFinder::with_defaults();
/// let request = SearchRequest::new("/library").with_extras(vec![PathBuf::from("/incoming")]);
/// let session = finder.search(&request).unwrap();
/// println!("{} extra files matched", session.summary.extras_matched);
/// ```
pub struct DupeFinder<H: ContentHasher = Hasher> {
    config: FinderConfig,
    comparator: Comparator<H>,
}

impl DupeFinder<Hasher> {
    /// Create a finder with default configuration and SHA-256 hashing.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default(), Hasher::new())
    }
}

impl<H: ContentHasher> DupeFinder<H> {
    /// Create a finder hashing through `hasher`.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration for the finder
    /// * `hasher` - Content hasher used for signatures
    #[must_use]
    pub fn new(config: FinderConfig, hasher: H) -> Self {
        Self {
            config,
            comparator: Comparator::new(hasher),
        }
    }

    /// The comparator, with its hashing counters.
    #[must_use]
    pub fn comparator(&self) -> &Comparator<H> {
        &self.comparator
    }

    /// Run one search.
    ///
    /// Extras and exclusions that do not exist are logged and skipped. A
    /// root that is not a directory yields an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Resolve`] if a relative path cannot be made
    /// absolute.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchSession, SearchError> {
        let start = Instant::now();
        let summary = SearchSummary::started();
        let hashes_before = self.comparator.hashes_computed();
        let failures_before = self.comparator.hash_failures();

        let root = resolve(&request.root)?;
        log::debug!("Searching for duplicate files in {}...", root.display());

        let mut filter = PathFilter::new(self.config.trash_dirs.clone());
        let extras = resolve_existing(&request.extras, "cannot scan it")?;
        for extra in &extras {
            log::debug!("  will check {}", extra.display());
        }
        for exclusion in resolve_existing(&request.exclusions, "ignoring exclusion")? {
            filter.add_exclusion(&exclusion);
        }
        for extra in &extras {
            filter.add_overlap_if_inside(extra, &root);
        }

        let mut session = SearchSession {
            root,
            exclusions: filter.exclusion_paths(),
            overlaps: filter.overlap_paths(),
            extras,
            mode: SearchMode::Skipped,
            summary,
            matches: Vec::new(),
            queue: RemovalQueue::default(),
        };

        if !session.root.is_dir() {
            log::warn!(
                "{} is not a directory, nothing to search",
                session.root.display()
            );
        } else {
            self.report_phase_start(PHASE_SCANNING, 0);
            let tree = DirTree::build(&session.root, &self.config.tree_options)
                .map_err(|source| SearchError::Resolve {
                    path: session.root.clone(),
                    source,
                })?;
            if request.extras.is_empty() {
                self.report_phase_end(PHASE_SCANNING);
                session.mode = SearchMode::SelfScan;
                self.self_scan(&tree, &filter, &mut session);
            } else {
                let targets = self.build_targets(&session.extras)?;
                self.report_phase_end(PHASE_SCANNING);
                session.mode = SearchMode::CrossScan;
                self.cross_scan(&tree, &targets, &filter, request.remove, &mut session);
            }
        }

        session.summary.hashes_computed = self.comparator.hashes_computed() - hashes_before;
        session.summary.hash_failures = self.comparator.hash_failures() - failures_before;
        session.summary.finished_at = Local::now();
        session.summary.duration = start.elapsed();
        log::debug!(
            "Search finished: {} matches, {} files hashed in {:?}",
            session.matches.len(),
            session.summary.hashes_computed,
            session.summary.duration
        );
        Ok(session)
    }

    fn self_scan(&self, tree: &DirTree, filter: &PathFilter, session: &mut SearchSession) {
        let total = tree.root_node().total_files;
        session.summary.files_checked = total;
        log::debug!("Finding all duplicate files in {}", session.root.display());
        log::debug!("  searching {total} files against each other");

        self.report_phase_start(PHASE_COMPARING, total);
        for (i, f1) in tree.files().enumerate() {
            self.report_progress(i + 1, &f1.path);
            if !filter.is_searchable(&f1.path, Side::Extra) {
                log::trace!("{} is not searchable.", f1.path.display());
                continue;
            }
            let mut counted = false;
            for f2 in tree.files().skip(i + 1) {
                if !filter.is_searchable(&f2.path, Side::Protected) {
                    log::trace!("{} is not searchable.", f2.path.display());
                    continue;
                }
                self.check_pair(f1, f2, &mut counted, false, session);
            }
        }
        self.report_phase_end(PHASE_COMPARING);
    }

    fn cross_scan(
        &self,
        tree: &DirTree,
        targets: &[(PathBuf, Target)],
        filter: &PathFilter,
        queue_matches: bool,
        session: &mut SearchSession,
    ) {
        let protected_total = tree.root_node().total_files;
        let total: usize = targets.iter().map(|(_, t)| t.file_count()).sum();
        session.summary.files_checked = total;

        self.report_phase_start(PHASE_COMPARING, total);
        let mut current = 0;
        for (path, target) in targets {
            log::debug!(
                "Finding all duplicates of {} in {}",
                path.display(),
                session.root.display()
            );
            log::debug!(
                "  checking {} extra files against {} protected files.",
                target.file_count(),
                protected_total
            );

            for extra in target.files() {
                current += 1;
                self.report_progress(current, &extra.path);
                if !filter.is_searchable(&extra.path, Side::Extra) {
                    log::trace!("{} is not searchable.", extra.path.display());
                    continue;
                }
                if filter.is_protected(&extra.path, &session.root) {
                    log::debug!(
                        "{} is part of the protected tree, not checking it",
                        extra.path.display()
                    );
                    continue;
                }

                let mut counted = false;
                for original in tree.files() {
                    if original.path == extra.path {
                        continue;
                    }
                    if !filter.is_searchable(&original.path, Side::Protected) {
                        log::trace!("{} is not searchable.", original.path.display());
                        continue;
                    }
                    self.check_pair(extra, original, &mut counted, queue_matches, session);
                }
            }
        }
        self.report_phase_end(PHASE_COMPARING);
    }

    /// Compare one pair and record a match. `counted` tracks whether `extra`
    /// has already been counted in this run.
    fn check_pair(
        &self,
        extra: &FileEntry,
        original: &FileEntry,
        counted: &mut bool,
        queue_matches: bool,
        session: &mut SearchSession,
    ) {
        log::trace!("{} vs {}", extra.path.display(), original.path.display());
        let kind = self.comparator.compare(extra, original);
        if !kind.is_match() {
            return;
        }

        let summary = &mut session.summary;
        if !*counted {
            *counted = true;
            summary.extras_matched += 1;
            summary.extras_bytes += extra.size;
            log::debug!("{extra}");
        }
        log::debug!("    == {original}");
        summary.originals_matched += 1;
        summary.originals_bytes += original.size;

        session.matches.push(DuplicateMatch {
            extra: extra.path.clone(),
            original: original.path.clone(),
            kind,
            size: extra.size,
        });
        if queue_matches {
            session.queue.push(extra);
        }
    }

    fn build_targets(&self, extras: &[PathBuf]) -> Result<Vec<(PathBuf, Target)>, SearchError> {
        let mut targets = Vec::with_capacity(extras.len());
        for path in extras {
            if path.is_dir() {
                let tree = DirTree::build(path, &self.config.tree_options).map_err(|source| {
                    SearchError::Resolve {
                        path: path.clone(),
                        source,
                    }
                })?;
                targets.push((path.clone(), Target::Dir(tree)));
            } else {
                match FileEntry::from_path(path) {
                    Ok(file) => targets.push((path.clone(), Target::File(file))),
                    Err(e) => log::warn!("{}, cannot scan it.", e),
                }
            }
        }
        Ok(targets)
    }

    fn report_phase_start(&self, phase: &str, total: usize) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    fn report_progress(&self, current: usize, path: &Path) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(current, &path.to_string_lossy());
        }
    }

    fn report_phase_end(&self, phase: &str) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(phase);
        }
    }
}

fn resolve(path: &Path) -> Result<PathBuf, SearchError> {
    path_utils::absolutize(path).map_err(|source| SearchError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve `paths`, dropping (and reporting) the ones that do not exist.
fn resolve_existing(paths: &[PathBuf], what: &str) -> Result<Vec<PathBuf>, SearchError> {
    let mut resolved = Vec::with_capacity(paths.len());
    for path in paths {
        let path = resolve(path)?;
        if !path.exists() {
            log::warn!("  {} does not exist, {}.", path.display(), what);
            continue;
        }
        if !resolved.contains(&path) {
            resolved.push(path);
        }
    }
    Ok(resolved)
}
