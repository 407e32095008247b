//! In-memory snapshot of a directory subtree.
//!
//! # Overview
//!
//! [`DirTree::build`] walks a directory eagerly and synchronously with
//! `walkdir`, turning every regular file into a [`FileEntry`] (size and
//! timestamps captured, content not hashed) and every subdirectory into a
//! [`DirNode`]. Nodes live
//! in an arena and refer to each other by [`DirId`]; a child holds its
//! parent's id, never the parent itself.
//!
//! Each node carries four aggregates: own file count and bytes, and the same
//! totals including all descendants. A child adds its totals to its parent
//! exactly once, when the walk leaves it (the next entry is shallower, or the
//! walk ends). A directory that cannot be read stays un-expanded with zero
//! totals but is still counted as a subdirectory of its parent.
//!
//! Each node also keeps a size index (`files_by_size`) merged up from its
//! descendants. Nothing in the search depends on it being present.
//!
//! Children are visited in file-name order so snapshots are deterministic.
//! Symbolic links are neither followed nor recorded.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::path_utils;
use super::{FileEntry, ScanError};

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Index of a directory node in a [`DirTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirId(usize);

impl DirId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Location of a file: owning directory plus position in its file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileRef {
    /// Owning directory
    pub dir: DirId,
    /// Index into that directory's `files`
    pub index: usize,
}

/// Options for building a tree.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Skip files and directories whose names start with `.`.
    pub skip_hidden: bool,
}

/// One directory in a [`DirTree`].
#[derive(Debug, Clone)]
pub struct DirNode {
    /// Absolute normalized path
    pub path: PathBuf,
    /// Base name
    pub name: String,
    /// Path of the containing directory
    pub parent_path: PathBuf,
    /// Arena id of the parent node, if it is part of the same tree
    pub parent: Option<DirId>,
    /// Distance from the tree root
    pub depth: usize,
    /// Files directly in this directory
    pub files: Vec<FileEntry>,
    /// Immediate subdirectories
    pub subdirs: Vec<DirId>,
    /// Files of this subtree grouped by byte size
    pub files_by_size: HashMap<u64, Vec<FileRef>>,
    /// Own file count
    pub num_files: usize,
    /// Own subdirectory count
    pub num_subdirs: usize,
    /// Own byte count
    pub bytes: u64,
    /// Files including all descendants
    pub total_files: usize,
    /// Subdirectories including all descendants
    pub total_subdirs: usize,
    /// Bytes including all descendants
    pub total_bytes: u64,
    /// Whether the directory was actually walked
    pub expanded: bool,
}

impl DirNode {
    fn new(path: PathBuf, parent: Option<DirId>, depth: usize) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            name,
            parent_path,
            parent,
            depth,
            files: Vec::new(),
            subdirs: Vec::new(),
            files_by_size: HashMap::new(),
            num_files: 0,
            num_subdirs: 0,
            bytes: 0,
            total_files: 0,
            total_subdirs: 0,
            total_bytes: 0,
            expanded: false,
        }
    }

    fn merge_size_index(&mut self, other: &HashMap<u64, Vec<FileRef>>) {
        for (size, refs) in other {
            self.files_by_size
                .entry(*size)
                .or_default()
                .extend_from_slice(refs);
        }
    }
}

impl fmt::Display for DirNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} in {} files)",
            self.path.display(),
            crate::format::size_str(self.total_bytes),
            self.total_files
        )
    }
}

/// Arena of directory nodes rooted at one directory.
#[derive(Debug, Clone)]
pub struct DirTree {
    nodes: Vec<DirNode>,
    root: DirId,
}

impl DirTree {
    /// Snapshot the subtree at `path`.
    ///
    /// A path that is not a directory, or cannot be listed, yields a tree
    /// with a single un-expanded root and zero totals; the condition is
    /// logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if `path` is relative and the current directory
    /// cannot be determined.
    pub fn build(path: &Path, options: &TreeOptions) -> io::Result<Self> {
        let path = path_utils::absolutize(path)?;
        let mut tree = Self {
            nodes: Vec::new(),
            root: DirId(0),
        };
        if path.is_dir() {
            tree.walk(&path, options);
        } else {
            log::warn!("{}, nothing to walk", ScanError::NotADirectory(path.clone()));
        }
        if tree.nodes.is_empty() {
            tree.nodes.push(DirNode::new(path, None, 0));
        }
        Ok(tree)
    }

    fn walk(&mut self, root: &Path, options: &TreeOptions) {
        let skip_hidden = options.skip_hidden;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let hidden = entry.depth() > 0 && is_hidden(entry);
                if skip_hidden && hidden {
                    log::trace!("Skipping hidden entry: {}", entry.path().display());
                }
                !(skip_hidden && hidden)
            });

        // Directories whose walk is still in progress, root first.
        let mut open: Vec<DirId> = Vec::new();
        let mut unreadable: HashSet<DirId> = HashSet::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    match (open.last(), e.path()) {
                        (Some(&id), Some(path)) if self.nodes[id.0].path == path => {
                            log::warn!("Cannot read directory {}: {}", path.display(), e);
                            unreadable.insert(id);
                        }
                        _ => log::warn!("Error walking {}: {}", root.display(), e),
                    }
                    continue;
                }
            };

            while open.len() > entry.depth() {
                if let Some(done) = open.pop() {
                    self.finish(done, !unreadable.contains(&done));
                }
            }
            let parent = open.last().copied();

            if entry.file_type().is_dir() {
                let id = DirId(self.nodes.len());
                self.nodes
                    .push(DirNode::new(entry.path().to_path_buf(), parent, entry.depth()));
                if let Some(parent) = parent {
                    let node = &mut self.nodes[parent.0];
                    node.num_subdirs += 1;
                    node.subdirs.push(id);
                }
                open.push(id);
            } else if let (true, Some(dir)) = (entry.file_type().is_file(), parent) {
                match FileEntry::from_dir_entry(&entry) {
                    Ok(file) => {
                        let node = &mut self.nodes[dir.0];
                        node.num_files += 1;
                        node.bytes += file.size;
                        let file_ref = FileRef {
                            dir,
                            index: node.files.len(),
                        };
                        node.files_by_size.entry(file.size).or_default().push(file_ref);
                        node.files.push(file);
                    }
                    Err(e) => log::warn!("Skipping file: {}", e),
                }
            } else {
                log::trace!("Skipping non-regular entry: {}", entry.path().display());
            }
        }

        while let Some(done) = open.pop() {
            self.finish(done, !unreadable.contains(&done));
        }
    }

    /// Close a directory once everything below it has been visited: fold its
    /// own counts into its totals, then hand totals and size index to the parent.
    fn finish(&mut self, id: DirId, readable: bool) {
        let node = &mut self.nodes[id.0];
        if readable {
            node.total_files += node.num_files;
            node.total_subdirs += node.num_subdirs;
            node.total_bytes += node.bytes;
            node.expanded = true;
        }
        let (files, subdirs, bytes) = (node.total_files, node.total_subdirs, node.total_bytes);

        log::trace!(
            "{} walked: {}/{} subdirs, {}/{} files, {}/{} bytes",
            node.path.display(),
            node.num_subdirs,
            subdirs,
            node.num_files,
            files,
            node.bytes,
            bytes
        );

        if let Some(parent) = node.parent {
            let index = node.files_by_size.clone();
            let parent = &mut self.nodes[parent.0];
            parent.total_files += files;
            parent.total_subdirs += subdirs;
            parent.total_bytes += bytes;
            parent.merge_size_index(&index);
        }
    }

    /// Id of the root node.
    #[must_use]
    pub fn root(&self) -> DirId {
        self.root
    }

    /// The root node.
    #[must_use]
    pub fn root_node(&self) -> &DirNode {
        self.node(self.root)
    }

    /// Look up a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    #[must_use]
    pub fn node(&self, id: DirId) -> &DirNode {
        &self.nodes[id.0]
    }

    /// Number of directory nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Never true for a built tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve a [`FileRef`].
    #[must_use]
    pub fn file(&self, file_ref: FileRef) -> &FileEntry {
        &self.nodes[file_ref.dir.0].files[file_ref.index]
    }

    /// Fresh iterator over every file in the tree.
    #[must_use]
    pub fn files(&self) -> FileIter<'_> {
        self.files_under(self.root)
    }

    /// Fresh iterator over every file below `dir`.
    #[must_use]
    pub fn files_under(&self, dir: DirId) -> FileIter<'_> {
        FileIter {
            tree: self,
            stack: vec![Cursor::new(dir)],
        }
    }

    /// Files of exactly `size` bytes below `dir`, via the size index.
    pub fn files_of_size(&self, dir: DirId, size: u64) -> impl Iterator<Item = &FileEntry> {
        self.node(dir)
            .files_by_size
            .get(&size)
            .into_iter()
            .flatten()
            .map(|file_ref| self.file(*file_ref))
    }
}

impl<'a> IntoIterator for &'a DirTree {
    type Item = &'a FileEntry;
    type IntoIter = FileIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.files()
    }
}

#[derive(Debug, Clone)]
struct Cursor {
    dir: DirId,
    next_file: usize,
    next_subdir: usize,
}

impl Cursor {
    fn new(dir: DirId) -> Self {
        Self {
            dir,
            next_file: 0,
            next_subdir: 0,
        }
    }
}

/// Depth-first iterator over the files of a subtree.
///
/// A directory's own files come first, then each subdirectory in turn.
/// Iteration reads only the in-memory tree; ask the tree for a new iterator
/// to start over.
#[derive(Debug, Clone)]
pub struct FileIter<'a> {
    tree: &'a DirTree,
    stack: Vec<Cursor>,
}

impl<'a> Iterator for FileIter<'a> {
    type Item = &'a FileEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let cursor = self.stack.last_mut()?;
            let node = tree.node(cursor.dir);

            if cursor.next_file < node.files.len() {
                let file = &node.files[cursor.next_file];
                cursor.next_file += 1;
                return Some(file);
            }

            if cursor.next_subdir < node.subdirs.len() {
                let child = node.subdirs[cursor.next_subdir];
                cursor.next_subdir += 1;
                self.stack.push(Cursor::new(child));
                continue;
            }

            self.stack.pop();
        }
    }
}
