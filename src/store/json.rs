//! Durable JSON-file store.
//! - The whole store is one JSON document `{ "records": [...] }`.
//! - Every read-modify-write cycle holds an in-process mutex and an exclusive
//!   `fs2` lock on the sidecar `<file>.lock`, so separate processes and
//!   concurrent tasks don't lose each other's updates.
//! - Writes go to a temp file in the same directory and are renamed into place.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, trace};

use super::MetadataStore;
use crate::errors::StoreError;
use crate::fs_ops::{fsync_dir, unique_temp_path};
use crate::record::DownloadRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: Vec<DownloadRecord>,
}

/// Store persisted as a single JSON file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock_path: PathBuf,
    guard: Mutex<()>,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl JsonStore {
    /// Open the store at `path`, creating an empty one (and its parent) if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        let store = Self {
            lock_path: PathBuf::from(lock_name),
            path,
            guard: Mutex::new(()),
        };

        if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        store.with_lock(|| {
            if !store.path.exists() {
                debug!(path = %store.path.display(), "creating empty record store");
                store.save(&StoreDocument::default())?;
            } else {
                // Surface a malformed file at open time rather than mid-relocation.
                store.load()?;
            }
            Ok(())
        })?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace the record keyed by its url.
    pub fn insert(&self, record: DownloadRecord) -> Result<(), StoreError> {
        self.with_lock(|| {
            let mut doc = self.load()?;
            match doc.records.iter_mut().find(|r| r.url == record.url) {
                Some(existing) => *existing = record,
                None => doc.records.push(record),
            }
            self.save(&doc)
        })
    }

    /// Snapshot of every record, in file order.
    pub fn records(&self) -> Result<Vec<DownloadRecord>, StoreError> {
        self.with_lock(|| Ok(self.load()?.records))
    }

    fn with_lock<R>(&self, f: impl FnOnce() -> Result<R, StoreError>) -> Result<R, StoreError> {
        let _local = self.guard.lock().map_err(|_| StoreError::Poisoned)?;
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(io_err(&self.lock_path))?;
        lock_file
            .lock_exclusive()
            .map_err(io_err(&self.lock_path))?;
        trace!(path = %self.lock_path.display(), "store lock acquired");
        let out = f();
        let _ = FileExt::unlock(&lock_file);
        out
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        let bytes = fs::read(&self.path).map_err(io_err(&self.path))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StoreDocument::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        };
        let tmp = unique_temp_path(&dir);
        let bytes = serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let write = || -> std::io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(&self.path)(e));
        }
        // Best-effort: persist the rename itself.
        let _ = fsync_dir(&dir);
        Ok(())
    }
}

impl MetadataStore for JsonStore {
    fn get_record(&self, url: &str) -> Result<Option<DownloadRecord>, StoreError> {
        self.with_lock(|| Ok(self.load()?.records.into_iter().find(|r| r.url == url)))
    }

    fn update_directory(&self, url: &str, new_dir: &str) -> Result<(), StoreError> {
        self.with_lock(|| {
            let mut doc = self.load()?;
            let record = doc
                .records
                .iter_mut()
                .find(|r| r.url == url)
                .ok_or_else(|| StoreError::UnknownUrl(url.to_string()))?;
            if record.file_dir == new_dir {
                return Ok(());
            }
            record.file_dir = new_dir.to_string();
            self.save(&doc)?;
            debug!(url, dir = new_dir, "record directory updated");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DownloadStatus;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_store() {
        let td = tempdir().unwrap();
        let path = td.path().join("nested").join("records.json");
        let store = JsonStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn updates_survive_reopen() {
        let td = tempdir().unwrap();
        let path = td.path().join("records.json");
        {
            let store = JsonStore::open(&path).unwrap();
            store
                .insert(DownloadRecord::new("a", "/old", "x.mp4", DownloadStatus::Completed))
                .unwrap();
            store.update_directory("a", "/new").unwrap();
        }
        let reopened = JsonStore::open(&path).unwrap();
        let rec = reopened.get_record("a").unwrap().unwrap();
        assert_eq!(rec.file_dir, "/new");
        assert_eq!(rec.status, DownloadStatus::Completed);
    }

    #[test]
    fn malformed_file_is_rejected() {
        let td = tempdir().unwrap();
        let path = td.path().join("records.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let td = tempdir().unwrap();
        let path = td.path().join("records.json");
        let store = JsonStore::open(&path).unwrap();
        store
            .insert(DownloadRecord::new("a", "/old", "x", DownloadStatus::Paused))
            .unwrap();
        let leftovers: Vec<_> = fs::read_dir(td.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
