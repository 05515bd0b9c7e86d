//! Relocation task.
//!
//! Moves one download's file into a new directory and keeps its metadata record
//! in step. The record is updated first, then the file is renamed; if the rename
//! fails the record is pointed back at the original directory (two attempts).
//!
//! Every step reports failure as a `FailReason` value. `run` funnels the single
//! outcome through one finalization point, so the listener always sees at most
//! one Prepared followed by exactly one Success or Failed, including when
//! something in the run panics.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

use crate::context::panic_message;
use crate::errors::{FailKind, FailReason};
use crate::fs_ops::{
    ensure_dir, is_cross_device, relocation_paths, source_is_regular_file, target_exists,
    try_atomic_move,
};
use crate::listener::{Dispatch, RelocationEvent, RelocationListener, notify};
use crate::record::DownloadRecord;
use crate::store::MetadataStore;

/// Compensating directory updates attempted after a failed rename.
const ROLLBACK_ATTEMPTS: usize = 2;

/// Everything one relocation needs. Immutable once the task is built.
#[derive(Clone)]
pub struct RelocationRequest {
    pub url: String,
    pub destination_dir: PathBuf,
    pub store: Arc<dyn MetadataStore>,
    pub listener: Option<Arc<dyn RelocationListener>>,
    pub dispatch: Dispatch,
}

impl RelocationRequest {
    pub fn new(
        url: impl Into<String>,
        destination_dir: impl Into<PathBuf>,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            url: url.into(),
            destination_dir: destination_dir.into(),
            store,
            listener: None,
            dispatch: Dispatch::Inline,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn RelocationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }
}

impl std::fmt::Debug for RelocationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelocationRequest")
            .field("url", &self.url)
            .field("destination_dir", &self.destination_dir)
            .field("has_listener", &self.listener.is_some())
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Result of a run; mirrors the terminal event sent to the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Record as it now stands, pointing at the destination directory.
    Success(DownloadRecord),
    Failed(Option<DownloadRecord>, FailReason),
}

impl RelocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RelocationOutcome::Success(_))
    }

    pub fn fail_kind(&self) -> Option<FailKind> {
        match self {
            RelocationOutcome::Success(_) => None,
            RelocationOutcome::Failed(_, reason) => Some(reason.kind),
        }
    }
}

/// One relocation. Built per request, run once.
#[derive(Debug)]
pub struct RelocationTask {
    request: RelocationRequest,
}

impl RelocationTask {
    pub fn new(request: RelocationRequest) -> Self {
        Self { request }
    }

    pub fn run(self) -> RelocationOutcome {
        let span = info_span!("relocate", url = %self.request.url);
        let _entered = span.enter();

        let mut snapshot: Option<DownloadRecord> = None;
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.relocate(&mut snapshot)))
            .unwrap_or_else(|payload| {
                Err(FailReason::exception(format!(
                    "relocation panicked: {}",
                    panic_message(payload)
                )))
            });
        self.finish(snapshot, result)
    }

    fn relocate(&self, snapshot: &mut Option<DownloadRecord>) -> Result<DownloadRecord, FailReason> {
        let url = self.request.url.as_str();
        let dest_dir = self.request.destination_dir.as_path();

        let record = self
            .request
            .store
            .get_record(url)
            .map_err(|e| FailReason::exception(format!("record lookup failed: {e}")))?
            .ok_or_else(|| FailReason::new(FailKind::NullRecord, "no download record for url"))?;
        *snapshot = Some(record.clone());

        self.emit(RelocationEvent::Prepared(record.clone()));

        if !record.status.is_movable() {
            return Err(FailReason::new(
                FailKind::StatusError,
                format!("download status '{}' does not allow moving", record.status),
            ));
        }

        let paths = relocation_paths(&record, dest_dir);
        debug!(from = %paths.from.display(), to = %paths.to.display(), status = %record.status, "relocation paths");

        // Already relocated: the file is no longer at a source distinct from the target.
        if paths.from == paths.to {
            return Err(FailReason::new(
                FailKind::SourceNotFound,
                format!("file already lives in {}", dest_dir.display()),
            ));
        }
        if !source_is_regular_file(&paths.from)? {
            return Err(FailReason::new(
                FailKind::SourceNotFound,
                format!("original file does not exist: {}", paths.from.display()),
            ));
        }
        if target_exists(&paths.to)? {
            return Err(FailReason::new(
                FailKind::TargetExists,
                format!("target file exists: {}", paths.to.display()),
            ));
        }

        ensure_dir(dest_dir)?;

        let new_dir = dir_string(dest_dir)?;
        let old_dir = record.file_dir.clone();

        self.update_directory(&new_dir).map_err(|e| {
            FailReason::new(FailKind::RecordUpdateError, format!("update record error: {e}"))
        })?;
        debug!(dir = %new_dir, "record now points at destination");

        if let Err(e) = try_atomic_move(&paths.from, &paths.to) {
            warn!(error = %e, from = %paths.from.display(), to = %paths.to.display(), "Rename failed after record update; rolling back record");
            if is_cross_device(&e) {
                warn!("Source and destination are on different filesystems; files are never copied");
            }
            self.roll_back(&old_dir);
            return Err(FailReason::new(
                FailKind::RecordUpdateError,
                format!("update record error: file rename failed: {e}"),
            ));
        }
        info!(from = %paths.from.display(), to = %paths.to.display(), "Renamed file atomically");

        let mut moved = record;
        moved.file_dir = new_dir;
        Ok(moved)
    }

    /// Store call that also turns a panicking backend into an error message.
    fn update_directory(&self, dir: &str) -> Result<(), String> {
        let store = &self.request.store;
        let url = self.request.url.as_str();
        match panic::catch_unwind(AssertUnwindSafe(|| store.update_directory(url, dir))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(format!("store panicked: {}", panic_message(payload))),
        }
    }

    /// Point the record back at `original_dir`. Gives up after `ROLLBACK_ATTEMPTS`;
    /// the record and the filesystem then disagree until someone repairs it.
    fn roll_back(&self, original_dir: &str) -> bool {
        for attempt in 1..=ROLLBACK_ATTEMPTS {
            match self.update_directory(original_dir) {
                Ok(()) => {
                    info!(attempt, dir = original_dir, "Record directory restored");
                    return true;
                }
                Err(e) => warn!(attempt, error = %e, dir = original_dir, "Record rollback failed"),
            }
        }
        error!(
            url = %self.request.url,
            recorded = %self.request.destination_dir.display(),
            actual = original_dir,
            "Record left pointing at destination while file stayed in place"
        );
        false
    }

    fn emit(&self, event: RelocationEvent) {
        notify(event, self.request.listener.as_ref(), &self.request.dispatch);
    }

    /// Terminal delivery runs outside the main `catch_unwind`; a listener panic
    /// here is logged and the outcome still returned.
    fn emit_terminal(&self, event: RelocationEvent) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.emit(event))) {
            error!(panic = %panic_message(payload), "listener panicked on terminal event");
        }
    }

    fn finish(
        &self,
        snapshot: Option<DownloadRecord>,
        result: Result<DownloadRecord, FailReason>,
    ) -> RelocationOutcome {
        match result {
            Ok(record) => {
                info!(dest = %record.file_dir, "Relocation completed");
                self.emit_terminal(RelocationEvent::Success(record.clone()));
                RelocationOutcome::Success(record)
            }
            Err(reason) => {
                warn!(code = reason.kind.code(), kind = %reason.kind, message = %reason.message, "Relocation failed");
                self.emit_terminal(RelocationEvent::Failed(snapshot.clone(), reason.clone()));
                RelocationOutcome::Failed(snapshot, reason)
            }
        }
    }
}

fn dir_string(dir: &Path) -> Result<String, FailReason> {
    dir.to_str().map(str::to_string).ok_or_else(|| {
        FailReason::exception(format!(
            "destination directory is not valid UTF-8: {}",
            dir.display()
        ))
    })
}
