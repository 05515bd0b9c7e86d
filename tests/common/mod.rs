#![allow(dead_code)]

use dl_relocate::{
    DownloadRecord, DownloadStatus, FailReason, MemoryStore, MetadataStore, RelocationEvent,
    RelocationListener, StoreError,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

/// Listener that records every event and the thread it arrived on.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(RelocationEvent, Option<String>)>>,
}

impl RecordingListener {
    fn push(&self, event: RelocationEvent) {
        let name = thread::current().name().map(str::to_string);
        self.events.lock().unwrap().push((event, name));
    }

    pub fn events(&self) -> Vec<RelocationEvent> {
        self.events.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn threads(&self) -> Vec<Option<String>> {
        self.events.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

impl RelocationListener for RecordingListener {
    fn on_prepared(&self, record: &DownloadRecord) {
        self.push(RelocationEvent::Prepared(record.clone()));
    }
    fn on_success(&self, record: &DownloadRecord) {
        self.push(RelocationEvent::Success(record.clone()));
    }
    fn on_failed(&self, record: Option<&DownloadRecord>, reason: &FailReason) {
        self.push(RelocationEvent::Failed(record.cloned(), reason.clone()));
    }
}

/// At most one Prepared, exactly one terminal event, terminal last.
pub fn assert_event_shape(events: &[RelocationEvent]) {
    let prepared = events.iter().filter(|e| !e.is_terminal()).count();
    let terminal = events.iter().filter(|e| e.is_terminal()).count();
    assert!(prepared <= 1, "more than one Prepared: {events:?}");
    assert_eq!(terminal, 1, "expected exactly one terminal event: {events:?}");
    assert!(
        events.last().is_some_and(RelocationEvent::is_terminal),
        "terminal event must come last: {events:?}"
    );
}

/// Store whose `update_directory` calls can be scripted to fail, with an
/// optional hook run on the first update (before it is applied).
pub struct ScriptedStore {
    pub inner: MemoryStore,
    calls: Mutex<Vec<String>>,
    fail_calls: HashSet<usize>,
    first_update_hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ScriptedStore {
    pub fn new(record: DownloadRecord) -> Self {
        Self {
            inner: MemoryStore::with_records([record]),
            calls: Mutex::new(Vec::new()),
            fail_calls: HashSet::new(),
            first_update_hook: Mutex::new(None),
        }
    }

    /// 1-based indices of `update_directory` calls that fail.
    pub fn failing_calls(mut self, calls: &[usize]) -> Self {
        self.fail_calls = calls.iter().copied().collect();
        self
    }

    pub fn on_first_update(self, hook: impl FnOnce() + Send + 'static) -> Self {
        *self.first_update_hook.lock().unwrap() = Some(Box::new(hook));
        self
    }

    pub fn update_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn dir_of(&self, url: &str) -> String {
        self.inner.get_record(url).unwrap().unwrap().file_dir
    }
}

impl MetadataStore for ScriptedStore {
    fn get_record(&self, url: &str) -> Result<Option<DownloadRecord>, StoreError> {
        self.inner.get_record(url)
    }

    fn update_directory(&self, url: &str, new_dir: &str) -> Result<(), StoreError> {
        let idx = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(new_dir.to_string());
            calls.len()
        };
        if idx == 1 {
            if let Some(hook) = self.first_update_hook.lock().unwrap().take() {
                hook();
            }
        }
        if self.fail_calls.contains(&idx) {
            return Err(StoreError::Backend(format!("scripted failure on call {idx}")));
        }
        self.inner.update_directory(url, new_dir)
    }
}

/// `<root>/old` holding `name` with some content; returns (old_dir, new_dir, old_file).
pub fn layout(root: &Path, name: &str) -> (PathBuf, PathBuf, PathBuf) {
    let old = root.join("old");
    let new = root.join("new");
    fs::create_dir_all(&old).unwrap();
    let file = old.join(name);
    fs::write(&file, b"video bytes").unwrap();
    (old, new, file)
}

pub fn record(url: &str, dir: &Path, name: &str, status: DownloadStatus) -> DownloadRecord {
    DownloadRecord::new(url, dir.to_str().unwrap(), name, status)
}
