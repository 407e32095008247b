use dupemgr::actions::{
    Confirmer, DeleteConfig, DeleteError, PolicyChoice, RemovalQueue, RemovalState,
    RemovalWorkflow, TerminalConfirmer,
};
use dupemgr::duplicates::{DupeFinder, SearchRequest};
use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, rel: &str, content: &[u8]) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().write_all(content).unwrap();
}

/// Answers from a fixed script; an exhausted script behaves like end of input.
struct Scripted {
    policies: Vec<Option<PolicyChoice>>,
    approvals: Vec<bool>,
    asked: Vec<PathBuf>,
}

impl Scripted {
    fn new(policies: Vec<Option<PolicyChoice>>, approvals: Vec<bool>) -> Self {
        Self {
            policies,
            approvals,
            asked: Vec::new(),
        }
    }
}

impl Confirmer for Scripted {
    fn choose_policy(&mut self, _queue: &RemovalQueue) -> io::Result<Option<PolicyChoice>> {
        if self.policies.is_empty() {
            return Ok(Some(PolicyChoice::Quit));
        }
        Ok(self.policies.remove(0))
    }

    fn confirm_removal(&mut self, path: &Path) -> io::Result<bool> {
        self.asked.push(path.to_path_buf());
        if self.approvals.is_empty() {
            return Ok(false);
        }
        Ok(self.approvals.remove(0))
    }
}

/// Library with one protected photo and an incoming directory holding a
/// copy of it plus one unrelated file.
fn photo_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let library = dir.join("library");
    let incoming = dir.join("incoming");
    write(&library, "img001.jpg", b"JPEGDATA");
    write(&incoming, "camera/photo.jpg", b"JPEGDATA");
    write(&incoming, "keep.txt", b"unique");
    (library, incoming)
}

fn search(library: &Path, incoming: &Path) -> dupemgr::duplicates::SearchSession {
    let request = SearchRequest::new(library)
        .with_extras(vec![incoming.to_path_buf()])
        .with_removal(true);
    DupeFinder::with_defaults().search(&request).unwrap()
}

#[test]
fn test_remove_all_deletes_extra_and_keeps_protected() {
    let dir = tempdir().unwrap();
    let (library, incoming) = photo_fixture(dir.path());
    let session = search(&library, &incoming);

    let mut workflow = RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone());
    let mut confirmer = Scripted::new(vec![Some(PolicyChoice::RemoveAll)], vec![]);
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert_eq!(workflow.state(), RemovalState::Force);
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.bytes_freed, 8);
    assert!(!incoming.join("camera/photo.jpg").exists());
    assert!(library.join("img001.jpg").exists());
    assert!(incoming.join("keep.txt").exists());
    // the emptied camera directory goes, the extras root stays
    assert!(!incoming.join("camera").exists());
    assert_eq!(result.removed_dirs, vec![incoming.join("camera")]);
    assert!(incoming.exists());
}

#[test]
fn test_unrecognized_answer_asks_again() {
    let dir = tempdir().unwrap();
    let (library, incoming) = photo_fixture(dir.path());
    let session = search(&library, &incoming);

    let mut workflow = RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone());
    let mut confirmer = Scripted::new(vec![None, None, Some(PolicyChoice::Quit)], vec![]);
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert_eq!(workflow.state(), RemovalState::Abort);
    assert!(result.aborted);
    assert!(result.successes.is_empty());
    assert!(incoming.join("camera/photo.jpg").exists());
}

#[test]
fn test_ask_each_honours_per_file_answers() {
    let dir = tempdir().unwrap();
    let library = dir.path().join("library");
    let incoming = dir.path().join("incoming");
    write(&library, "a.bin", b"AAAA");
    write(&library, "b.bin", b"BBBBB");
    write(&incoming, "a.bin", b"AAAA");
    write(&incoming, "b.bin", b"BBBBB");
    let session = search(&library, &incoming);
    assert_eq!(session.queue.len(), 2);

    let mut workflow = RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone());
    let mut confirmer = Scripted::new(vec![Some(PolicyChoice::AskEach)], vec![false, true]);
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert_eq!(confirmer.asked, vec![incoming.join("a.bin"), incoming.join("b.bin")]);
    assert_eq!(result.skipped, vec![incoming.join("a.bin")]);
    assert_eq!(result.success_count(), 1);
    assert!(incoming.join("a.bin").exists());
    assert!(!incoming.join("b.bin").exists());
}

#[test]
fn test_forced_workflow_never_asks() {
    let dir = tempdir().unwrap();
    let (library, incoming) = photo_fixture(dir.path());
    let session = search(&library, &incoming);

    let mut workflow =
        RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone()).forced();
    // would abort if asked
    let mut confirmer = Scripted::new(vec![Some(PolicyChoice::Quit)], vec![]);
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert_eq!(result.success_count(), 1);
    assert!(confirmer.policies.len() == 1 && confirmer.asked.is_empty());
}

#[test]
fn test_already_removed_file_is_not_an_error() {
    let dir = tempdir().unwrap();
    let (library, incoming) = photo_fixture(dir.path());
    let session = search(&library, &incoming);
    fs::remove_file(incoming.join("camera/photo.jpg")).unwrap();

    let mut workflow =
        RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone()).forced();
    let mut confirmer = Scripted::new(vec![], vec![]);
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert!(result.failures.is_empty());
    assert!(result.successes.is_empty());
    assert_eq!(result.already_absent, vec![incoming.join("camera/photo.jpg")]);
}

#[test]
fn test_empty_queue_is_a_no_op() {
    let dir = tempdir().unwrap();
    let mut workflow = RemovalWorkflow::new(DeleteConfig::permanent(), vec![dir.path().into()]);
    let mut confirmer = Scripted::new(vec![Some(PolicyChoice::RemoveAll)], vec![]);
    let result = workflow.run(&RemovalQueue::default(), &mut confirmer).unwrap();

    assert!(workflow.state().is_pending());
    assert_eq!(result.success_count(), 0);
    assert_eq!(confirmer.policies.len(), 1);
}

#[test]
fn test_terminal_confirmer_end_of_input_aborts() {
    let dir = tempdir().unwrap();
    let (library, incoming) = photo_fixture(dir.path());
    let session = search(&library, &incoming);

    let mut confirmer = TerminalConfirmer::new(Cursor::new(Vec::new()), Vec::new());
    let mut workflow = RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone());
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert!(result.aborted);
    assert!(incoming.join("camera/photo.jpg").exists());
    let printed = String::from_utf8(confirmer.into_output()).unwrap();
    assert!(printed.starts_with("1 duplicate files found."));
}

#[test]
fn test_terminal_confirmer_remove_all() {
    let dir = tempdir().unwrap();
    let (library, incoming) = photo_fixture(dir.path());
    let session = search(&library, &incoming);

    let mut confirmer = TerminalConfirmer::new(Cursor::new(b"a\n".to_vec()), Vec::new());
    let mut workflow = RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone());
    let result = workflow.run(&session.queue, &mut confirmer).unwrap();

    assert_eq!(result.success_count(), 1);
    assert!(!incoming.join("camera/photo.jpg").exists());
}

#[cfg(unix)]
#[test]
fn test_undeletable_file_is_recorded_and_processing_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let library = dir.path().join("library");
    let incoming = dir.path().join("incoming");
    write(&library, "a.bin", b"AAAA");
    write(&library, "b.bin", b"BBBBB");
    write(&incoming, "locked/a.bin", b"AAAA");
    write(&incoming, "open/b.bin", b"BBBBB");
    let session = search(&library, &incoming);
    assert_eq!(session.queue.len(), 2);

    let locked = incoming.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
    // root ignores directory permissions
    if fs::write(locked.join("probe"), b"").is_ok() {
        fs::remove_file(locked.join("probe")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let mut workflow =
        RemovalWorkflow::new(DeleteConfig::permanent(), session.extras.clone()).forced();
    let mut confirmer = Scripted::new(vec![], vec![]);
    let result = workflow.run(&session.queue, &mut confirmer);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let result = result.unwrap();
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.success_count(), 1);
    assert!(locked.join("a.bin").exists());
    assert!(!incoming.join("open/b.bin").exists());
}

#[test]
fn test_directory_removal_error_carries_path() {
    let err = DeleteError::DirectoryRemoval {
        path: PathBuf::from("/x/y"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(err.path(), Some(Path::new("/x/y")));
}
