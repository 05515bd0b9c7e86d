mod common;

use common::{RecordingListener, ScriptedStore, assert_event_shape, layout, record};
use dl_relocate::{
    DownloadStatus, FailKind, MemoryStore, MetadataStore, RelocationEvent, RelocationOutcome,
    RelocationRequest, RelocationTask,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn run_with(
    store: Arc<dyn MetadataStore>,
    url: &str,
    dest: &Path,
) -> (RelocationOutcome, Vec<RelocationEvent>) {
    let listener = Arc::new(RecordingListener::default());
    let req = RelocationRequest::new(url, dest, store).with_listener(listener.clone());
    let outcome = RelocationTask::new(req).run();
    let events = listener.events();
    assert_event_shape(&events);
    (outcome, events)
}

fn failed_kind(events: &[RelocationEvent]) -> FailKind {
    match events.last() {
        Some(RelocationEvent::Failed(_, reason)) => reason.kind,
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn completed_download_moves_and_record_follows() {
    let td = tempdir().unwrap();
    let (old, new, old_file) = layout(td.path(), "x.mp4");
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Completed,
    )]));

    let (outcome, events) = run_with(store.clone(), "a", &new);

    assert!(outcome.is_success());
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], RelocationEvent::Prepared(r) if r.file_dir == old.to_str().unwrap()));
    assert!(matches!(&events[1], RelocationEvent::Success(r) if r.file_dir == new.to_str().unwrap()));
    assert_eq!(store.get_record("a").unwrap().unwrap().file_dir, new.to_str().unwrap());
    assert!(!old_file.exists());
    assert_eq!(fs::read(new.join("x.mp4")).unwrap(), b"video bytes");
}

#[test]
fn existing_target_is_never_overwritten() {
    let td = tempdir().unwrap();
    let (old, new, old_file) = layout(td.path(), "x.mp4");
    fs::create_dir_all(&new).unwrap();
    fs::write(new.join("x.mp4"), b"someone else").unwrap();
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Completed,
    )]));

    let (outcome, events) = run_with(store.clone(), "a", &new);

    assert_eq!(outcome.fail_kind(), Some(FailKind::TargetExists));
    assert_eq!(failed_kind(&events), FailKind::TargetExists);
    assert!(matches!(events[0], RelocationEvent::Prepared(_)));
    assert!(old_file.exists());
    assert_eq!(fs::read(new.join("x.mp4")).unwrap(), b"someone else");
    assert_eq!(store.get_record("a").unwrap().unwrap().file_dir, old.to_str().unwrap());
}

#[test]
fn unknown_url_fails_without_prepared() {
    let td = tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let (outcome, events) = run_with(store, "missing", td.path());

    assert_eq!(events.len(), 1);
    match &events[0] {
        RelocationEvent::Failed(None, reason) => assert_eq!(reason.kind, FailKind::NullRecord),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(outcome, RelocationOutcome::Failed(None, _)));
}

#[test]
fn active_or_errored_downloads_are_not_moved() {
    for status in [
        DownloadStatus::Downloading,
        DownloadStatus::Waiting,
        DownloadStatus::Error,
        DownloadStatus::FileNotExist,
    ] {
        let td = tempdir().unwrap();
        let (old, new, _) = layout(td.path(), "x.mp4.temp");
        let store = Arc::new(ScriptedStore::new(record("a", &old, "x.mp4", status)));

        let (_, events) = run_with(store.clone(), "a", &new);

        assert_eq!(failed_kind(&events), FailKind::StatusError, "status {status}");
        assert!(store.update_calls().is_empty());
        assert!(old.join("x.mp4.temp").exists());
        assert!(!new.exists());
    }
}

#[test]
fn missing_source_file_is_reported() {
    let td = tempdir().unwrap();
    let old = td.path().join("old");
    fs::create_dir_all(&old).unwrap();
    let new = td.path().join("new");
    let store = Arc::new(ScriptedStore::new(record("a", &old, "x.mp4", DownloadStatus::Completed)));

    let (_, events) = run_with(store.clone(), "a", &new);

    assert_eq!(failed_kind(&events), FailKind::SourceNotFound);
    assert!(store.update_calls().is_empty());
    assert!(!new.exists());
}

#[test]
fn paused_download_moves_its_temp_file() {
    let td = tempdir().unwrap();
    let (old, new, temp_file) = layout(td.path(), "x.mp4.temp");
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Paused,
    )]));

    let (outcome, _) = run_with(store, "a", &new);

    assert!(outcome.is_success());
    assert!(!temp_file.exists());
    assert!(new.join("x.mp4.temp").is_file());
    assert!(!new.join("x.mp4").exists());
}

#[test]
fn nested_destination_is_created() {
    let td = tempdir().unwrap();
    let (old, _, _) = layout(td.path(), "x.mp4");
    let dest = td.path().join("a").join("b").join("c");
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Completed,
    )]));

    let (outcome, _) = run_with(store, "a", &dest);

    assert!(outcome.is_success());
    assert!(dest.join("x.mp4").is_file());
}

#[test]
fn second_run_reports_source_not_found() {
    let td = tempdir().unwrap();
    let (old, new, _) = layout(td.path(), "x.mp4");
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Completed,
    )]));

    let (first, _) = run_with(store.clone(), "a", &new);
    assert!(first.is_success());

    let (_, events) = run_with(store.clone(), "a", &new);
    assert_eq!(failed_kind(&events), FailKind::SourceNotFound);
    assert!(new.join("x.mp4").is_file());
    assert_eq!(store.get_record("a").unwrap().unwrap().file_dir, new.to_str().unwrap());
}

#[test]
fn stale_request_after_move_reports_source_not_found() {
    let td = tempdir().unwrap();
    let (old, new, _) = layout(td.path(), "x.mp4");
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Completed,
    )]));
    assert!(run_with(store.clone(), "a", &new).0.is_success());

    // A caller still holding the old directory points the record back at it.
    store.update_directory("a", old.to_str().unwrap()).unwrap();
    let (_, events) = run_with(store, "a", &new);
    assert_eq!(failed_kind(&events), FailKind::SourceNotFound);
    assert!(new.join("x.mp4").is_file());
}

#[test]
fn record_update_failure_leaves_file_alone() {
    let td = tempdir().unwrap();
    let (old, new, old_file) = layout(td.path(), "x.mp4");
    let store = Arc::new(
        ScriptedStore::new(record("a", &old, "x.mp4", DownloadStatus::Completed))
            .failing_calls(&[1]),
    );

    let (_, events) = run_with(store.clone(), "a", &new);

    assert_eq!(failed_kind(&events), FailKind::RecordUpdateError);
    assert_eq!(store.update_calls().len(), 1);
    assert_eq!(store.dir_of("a"), old.to_str().unwrap());
    assert!(old_file.exists());
    assert!(!new.join("x.mp4").exists());
}

/// Occupy the target with a non-empty directory once the record has been
/// updated, so the rename itself fails.
fn block_rename_hook(target: std::path::PathBuf) -> impl FnOnce() + Send + 'static {
    move || {
        fs::create_dir_all(target.join("occupied")).unwrap();
    }
}

#[test]
fn rename_failure_rolls_record_back() {
    let td = tempdir().unwrap();
    let (old, new, old_file) = layout(td.path(), "x.mp4");
    let store = Arc::new(
        ScriptedStore::new(record("a", &old, "x.mp4", DownloadStatus::Completed))
            .on_first_update(block_rename_hook(new.join("x.mp4"))),
    );

    let (outcome, events) = run_with(store.clone(), "a", &new);

    assert_eq!(failed_kind(&events), FailKind::RecordUpdateError);
    match outcome {
        RelocationOutcome::Failed(Some(r), reason) => {
            assert_eq!(r.file_dir, old.to_str().unwrap());
            assert!(reason.message.contains("rename"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        store.update_calls(),
        vec![new.to_str().unwrap().to_string(), old.to_str().unwrap().to_string()]
    );
    assert_eq!(store.dir_of("a"), old.to_str().unwrap());
    assert!(old_file.is_file());
}

#[test]
fn rollback_is_retried_once() {
    let td = tempdir().unwrap();
    let (old, new, old_file) = layout(td.path(), "x.mp4");
    let store = Arc::new(
        ScriptedStore::new(record("a", &old, "x.mp4", DownloadStatus::Completed))
            .on_first_update(block_rename_hook(new.join("x.mp4")))
            .failing_calls(&[2]),
    );

    let (_, events) = run_with(store.clone(), "a", &new);

    assert_eq!(failed_kind(&events), FailKind::RecordUpdateError);
    assert_eq!(store.update_calls().len(), 3);
    assert_eq!(store.dir_of("a"), old.to_str().unwrap());
    assert!(old_file.is_file());
}

#[test]
fn rollback_gives_up_after_two_attempts() {
    let td = tempdir().unwrap();
    let (old, new, old_file) = layout(td.path(), "x.mp4");
    let store = Arc::new(
        ScriptedStore::new(record("a", &old, "x.mp4", DownloadStatus::Completed))
            .on_first_update(block_rename_hook(new.join("x.mp4")))
            .failing_calls(&[2, 3]),
    );

    let (_, events) = run_with(store.clone(), "a", &new);

    // Still one terminal event with the same kind; the record is left stale.
    assert_eq!(failed_kind(&events), FailKind::RecordUpdateError);
    assert_eq!(store.update_calls().len(), 3);
    assert_eq!(store.dir_of("a"), new.to_str().unwrap());
    assert!(old_file.is_file());
}

#[test]
fn runs_without_a_listener() {
    let td = tempdir().unwrap();
    let (old, new, _) = layout(td.path(), "x.mp4");
    let store = Arc::new(MemoryStore::with_records([record(
        "a",
        &old,
        "x.mp4",
        DownloadStatus::Stopped,
    )]));
    fs::write(old.join("x.mp4.temp"), b"partial").unwrap();

    let outcome = RelocationTask::new(RelocationRequest::new("a", &new, store)).run();

    assert!(outcome.is_success());
    assert!(new.join("x.mp4.temp").is_file());
}
