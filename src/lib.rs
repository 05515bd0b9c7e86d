//! Core library for `dl_relocate`.
//!
//! Moves a download's file (finished or still in progress) into another
//! directory while keeping its metadata record consistent, and reports the
//! outcome to a listener either inline or through a callback context.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dl_relocate::{JsonStore, RelocationRequest, RelocationTask};
//!
//! let store = Arc::new(JsonStore::open("/var/lib/downloads/records.json").unwrap());
//! let outcome = RelocationTask::new(RelocationRequest::new(
//!     "https://example.com/x.mp4",
//!     "/mnt/media/videos",
//!     store,
//! ))
//! .run();
//! println!("{outcome:?}");
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod fs_ops;
pub mod listener;
pub mod output;
pub mod record;
pub mod shutdown;
pub mod store;
pub mod task;

pub use batch::{BatchReport, relocate_all};
pub use config::{Config, DispatchMode, LogLevel, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use context::{CallbackContext, ContextPoster, ContextThread};
pub use errors::{FailKind, FailReason, StoreError};
pub use listener::{Dispatch, RelocationEvent, RelocationListener, notify};
pub use record::{DownloadRecord, DownloadStatus};
pub use store::{JsonStore, MemoryStore, MetadataStore};
pub use task::{RelocationOutcome, RelocationRequest, RelocationTask};
