//! Metadata store seam.
//! The store is the durable source of truth for which directory holds a
//! download's file. Relocation only needs a lookup and a directory update.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use crate::errors::StoreError;
use crate::record::DownloadRecord;

/// Lookup and directory-update access to download records.
///
/// Implementations must tolerate `update_directory` being called repeatedly
/// with the same arguments.
pub trait MetadataStore: Send + Sync {
    /// Fetch the record for `url`, `Ok(None)` when unknown.
    fn get_record(&self, url: &str) -> Result<Option<DownloadRecord>, StoreError>;

    /// Point the record for `url` at `new_dir`.
    fn update_directory(&self, url: &str, new_dir: &str) -> Result<(), StoreError>;
}

impl<T: MetadataStore + ?Sized> MetadataStore for std::sync::Arc<T> {
    fn get_record(&self, url: &str) -> Result<Option<DownloadRecord>, StoreError> {
        (**self).get_record(url)
    }

    fn update_directory(&self, url: &str, new_dir: &str) -> Result<(), StoreError> {
        (**self).update_directory(url, new_dir)
    }
}
