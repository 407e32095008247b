use dupemgr::scanner::{DirTree, TreeOptions};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use walkdir::WalkDir;

fn write(dir: &Path, rel: &str, content: &[u8]) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn populate(dir: &Path) {
    write(dir, "a.txt", b"alpha");
    write(dir, "b.txt", b"bravo!");
    write(dir, "sub/c.txt", b"charlie");
    write(dir, "sub/deeper/d.txt", b"");
    write(dir, "sub/deeper/e.txt", b"echo echo");
    write(dir, "other/f.txt", b"foxtrot");
    fs::create_dir_all(dir.join("empty")).unwrap();
}

#[test]
fn test_totals_match_independent_walk() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let tree = DirTree::build(dir.path(), &TreeOptions::default()).unwrap();
    let root = tree.root_node();

    let files: Vec<_> = WalkDir::new(dir.path())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .collect();
    let dirs = WalkDir::new(dir.path())
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .count();
    let bytes: u64 = files.iter().map(|e| e.metadata().unwrap().len()).sum();

    assert_eq!(root.total_files, files.len());
    assert_eq!(root.total_subdirs, dirs);
    assert_eq!(root.total_bytes, bytes);
    assert_eq!(tree.files().count(), files.len());
}

#[test]
fn test_iteration_lists_own_files_before_subdirectories() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let tree = DirTree::build(dir.path(), &TreeOptions::default()).unwrap();
    let names: Vec<_> = tree
        .files()
        .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();

    let expected: Vec<_> = [
        "a.txt",
        "b.txt",
        "other/f.txt",
        "sub/c.txt",
        "sub/deeper/d.txt",
        "sub/deeper/e.txt",
    ]
    .iter()
    .map(|s| Path::new(s).to_path_buf())
    .collect();
    assert_eq!(names, expected);
}

#[test]
fn test_iteration_restarts() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let tree = DirTree::build(dir.path(), &TreeOptions::default()).unwrap();
    let first: Vec<_> = tree.files().map(|f| f.path.clone()).collect();
    let second: Vec<_> = tree.files().map(|f| f.path.clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_size_index_covers_subtree() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x/one.bin", b"1234");
    write(dir.path(), "y/two.bin", b"abcd");
    write(dir.path(), "three.bin", b"zz");

    let tree = DirTree::build(dir.path(), &TreeOptions::default()).unwrap();
    let four: Vec<_> = tree.files_of_size(tree.root(), 4).collect();
    assert_eq!(four.len(), 2);
    assert_eq!(tree.files_of_size(tree.root(), 99).count(), 0);
}

#[test]
fn test_non_directory_root_is_empty() {
    let dir = tempdir().unwrap();
    write(dir.path(), "plain", b"x");

    let tree = DirTree::build(&dir.path().join("plain"), &TreeOptions::default()).unwrap();
    assert_eq!(tree.root_node().total_files, 0);
    assert_eq!(tree.files().count(), 0);
    assert!(!tree.root_node().expanded);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "real/a.txt", b"alpha");
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("real/a.txt"), dir.path().join("a-link")).unwrap();

    let tree = DirTree::build(dir.path(), &TreeOptions::default()).unwrap();
    assert_eq!(tree.root_node().total_files, 1);
}
