use std::collections::HashMap;
use std::sync::Mutex;
use tracing::trace;

use super::MetadataStore;
use crate::errors::StoreError;
use crate::record::DownloadRecord;

/// Process-local store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, DownloadRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records` (later duplicates win).
    pub fn with_records(records: impl IntoIterator<Item = DownloadRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.url.clone(), r)).collect();
        Self {
            records: Mutex::new(map),
        }
    }

    /// Insert or replace the record keyed by its url.
    pub fn insert(&self, record: DownloadRecord) -> Result<(), StoreError> {
        let mut map = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        map.insert(record.url.clone(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for MemoryStore {
    fn get_record(&self, url: &str) -> Result<Option<DownloadRecord>, StoreError> {
        let map = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(url).cloned())
    }

    fn update_directory(&self, url: &str, new_dir: &str) -> Result<(), StoreError> {
        let mut map = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let record = map
            .get_mut(url)
            .ok_or_else(|| StoreError::UnknownUrl(url.to_string()))?;
        trace!(url, from = %record.file_dir, to = new_dir, "memory store: update directory");
        record.file_dir = new_dir.to_string();
        Ok(())
    }
}
