use dupemgr::duplicates::{
    DupeFinder, FinderConfig, MatchKind, SearchMode, SearchRequest,
};
use dupemgr::scanner::{Hasher, TreeOptions};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write(dir: &Path, rel: &str, content: &[u8]) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_self_search_empty_directory() {
    let dir = tempdir().unwrap();
    let session = DupeFinder::with_defaults()
        .search(&SearchRequest::new(dir.path()))
        .unwrap();

    assert_eq!(session.mode, SearchMode::SelfScan);
    assert!(session.matches.is_empty());
    assert_eq!(session.summary.files_checked, 0);
    assert_eq!(session.summary.hashes_computed, 0);
}

#[test]
fn test_self_search_finds_copy_in_subdirectory() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"XXXXXXXXXX");
    write(dir.path(), "b/a.txt", b"XXXXXXXXXX");
    write(dir.path(), "c.txt", b"YYYY");

    let session = DupeFinder::with_defaults()
        .search(&SearchRequest::new(dir.path()))
        .unwrap();

    assert_eq!(session.summary.files_checked, 3);
    assert_eq!(session.summary.extras_matched, 1);
    assert_eq!(session.summary.extras_bytes, 10);
    assert_eq!(session.summary.originals_matched, 1);
    assert_eq!(session.summary.originals_bytes, 10);
    assert_eq!(session.matches.len(), 1);

    let m = &session.matches[0];
    assert_eq!(m.extra, dir.path().join("a.txt"));
    assert_eq!(m.original, dir.path().join("b/a.txt"));
    assert_eq!(m.kind, MatchKind::Match);
    // a self search only reports
    assert!(session.queue.is_empty());
}

#[test]
fn test_self_search_three_copies_counts_each_pair_once() {
    let dir = tempdir().unwrap();
    write(dir.path(), "1.bin", b"same");
    write(dir.path(), "2.bin", b"same");
    write(dir.path(), "3.bin", b"same");

    let session = DupeFinder::with_defaults()
        .search(&SearchRequest::new(dir.path()))
        .unwrap();

    // pairs (1,2) (1,3) (2,3)
    assert_eq!(session.matches.len(), 3);
    assert_eq!(session.summary.extras_matched, 2);
    assert_eq!(session.summary.originals_matched, 3);
    assert!(session
        .matches
        .iter()
        .all(|m| m.kind == MatchKind::ContentMatch));
}

#[test]
fn test_cross_search_queues_only_extras() {
    let dir = tempdir().unwrap();
    let library = dir.path().join("library");
    let incoming = dir.path().join("incoming");
    write(&library, "img001.jpg", b"pixels");
    write(&library, "notes.txt", b"notes");
    write(&incoming, "photo.jpg", b"pixels");
    write(&incoming, "new.txt", b"fresh");

    let request = SearchRequest::new(&library)
        .with_extras(vec![incoming.clone()])
        .with_removal(true);
    let session = DupeFinder::with_defaults().search(&request).unwrap();

    assert_eq!(session.mode, SearchMode::CrossScan);
    assert_eq!(session.summary.files_checked, 2);
    assert_eq!(session.queue.len(), 1);
    assert!(session.queue.contains(&incoming.join("photo.jpg")));
    assert!(!session.queue.contains(&library.join("img001.jpg")));
    assert_eq!(session.queue.total_bytes(), 6);
}

#[test]
fn test_cross_search_without_removal_queues_nothing() {
    let dir = tempdir().unwrap();
    let library = dir.path().join("library");
    write(&library, "a", b"data");
    write(dir.path(), "copy", b"data");

    let request = SearchRequest::new(&library).with_extras(vec![dir.path().join("copy")]);
    let session = DupeFinder::with_defaults().search(&request).unwrap();

    assert!(session.has_duplicates());
    assert!(session.queue.is_empty());
}

#[test]
fn test_extra_inside_root_only_matches_outside_itself() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep/a.dat", b"payload");
    write(dir.path(), "inbox/a.dat", b"payload");

    let inbox = dir.path().join("inbox");
    let request = SearchRequest::new(dir.path())
        .with_extras(vec![inbox.clone()])
        .with_removal(true);
    let session = DupeFinder::with_defaults().search(&request).unwrap();

    assert_eq!(session.overlaps, vec![inbox.clone()]);
    assert_eq!(session.queue.len(), 1);
    assert!(session.queue.contains(&inbox.join("a.dat")));
    assert!(session
        .matches
        .iter()
        .all(|m| m.original == dir.path().join("keep/a.dat")));
}

#[test]
fn test_exclusion_hides_both_sides() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), "tmp/a.txt", b"copy");

    let request =
        SearchRequest::new(dir.path()).with_exclusions(vec![dir.path().join("tmp")]);
    let session = DupeFinder::with_defaults().search(&request).unwrap();

    assert_eq!(session.exclusions.len(), 1);
    assert!(session.matches.is_empty());
}

#[test]
fn test_missing_exclusion_is_ignored() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), "b.txt", b"copy");

    let request =
        SearchRequest::new(dir.path()).with_exclusions(vec![dir.path().join("nope")]);
    let session = DupeFinder::with_defaults().search(&request).unwrap();

    assert!(session.exclusions.is_empty());
    assert_eq!(session.matches.len(), 1);
}

#[test]
fn test_trash_directory_never_searched() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), ".Trash/a.txt", b"copy");

    let session = DupeFinder::with_defaults()
        .search(&SearchRequest::new(dir.path()))
        .unwrap();
    assert!(session.matches.is_empty());
}

#[test]
fn test_custom_trash_dirs() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), "recycle/a.txt", b"copy");

    let config = FinderConfig::default().with_trash_dirs(vec!["recycle".to_string()]);
    let finder = DupeFinder::new(config, Hasher::new());
    let session = finder.search(&SearchRequest::new(dir.path())).unwrap();
    assert!(session.matches.is_empty());
}

#[test]
fn test_skip_hidden_tree_option() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), ".cache/a.txt", b"copy");

    let config = FinderConfig::default().with_tree_options(TreeOptions { skip_hidden: true });
    let finder = DupeFinder::new(config, Hasher::new());
    let session = finder.search(&SearchRequest::new(dir.path())).unwrap();

    assert_eq!(session.summary.files_checked, 1);
    assert!(session.matches.is_empty());
}

#[test]
fn test_root_that_is_a_file_is_skipped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "plain.txt", b"x");

    let session = DupeFinder::with_defaults()
        .search(&SearchRequest::new(dir.path().join("plain.txt")))
        .unwrap();
    assert_eq!(session.mode, SearchMode::Skipped);
    assert_eq!(session.summary.files_checked, 0);
}

#[test]
fn test_files_of_different_size_are_never_hashed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"22");
    write(dir.path(), "c", b"333");

    let session = DupeFinder::with_defaults()
        .search(&SearchRequest::new(dir.path()))
        .unwrap();
    assert_eq!(session.summary.hashes_computed, 0);
    assert!(!session.has_duplicates());
}

#[test]
fn test_finder_reused_across_searches_reports_per_search_hashes() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same");
    write(dir.path(), "b", b"same");

    let finder = DupeFinder::with_defaults();
    let first = finder.search(&SearchRequest::new(dir.path())).unwrap();
    let second = finder.search(&SearchRequest::new(dir.path())).unwrap();

    assert_eq!(first.summary.hashes_computed, 2);
    // a fresh tree means fresh entries, so they are hashed again
    assert_eq!(second.summary.hashes_computed, 2);
    assert_eq!(first.matches.len(), second.matches.len());
}
