//! Typed error definitions for dl_relocate.
//! `StoreError` covers metadata store failures; `FailKind`/`FailReason` are the
//! values a relocation reports to its listener instead of raising.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a `MetadataStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No record for url: {0}")]
    UnknownUrl(String),

    #[error("Store I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("{0}")]
    Backend(String),
}

/// Why a relocation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailKind {
    /// No metadata record exists for the url.
    NullRecord,
    /// The record's status does not allow moving its file.
    StatusError,
    /// The file the record points at is missing.
    SourceNotFound,
    /// Something already occupies the destination path.
    TargetExists,
    /// The directory update failed, or the rename failed after it was committed.
    RecordUpdateError,
    /// Anything else, wrapped.
    Exception,
}

impl FailKind {
    /// Stable numeric code, used in structured logs and as the CLI exit status.
    pub fn code(&self) -> i32 {
        match self {
            FailKind::NullRecord => 10,
            FailKind::StatusError => 11,
            FailKind::SourceNotFound => 12,
            FailKind::TargetExists => 13,
            FailKind::RecordUpdateError => 14,
            FailKind::Exception => 15,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailKind::NullRecord => "null_record",
            FailKind::StatusError => "status_error",
            FailKind::SourceNotFound => "source_not_found",
            FailKind::TargetExists => "target_exists",
            FailKind::RecordUpdateError => "record_update_error",
            FailKind::Exception => "exception",
        }
    }
}

impl fmt::Display for FailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure value carried to `on_failed`. Never propagated as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FailReason {
    pub kind: FailKind,
    pub message: String,
}

impl FailReason {
    pub fn new(kind: FailKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Wrap an unexpected error as `FailKind::Exception`.
    pub fn exception(err: impl fmt::Display) -> Self {
        Self::new(FailKind::Exception, err.to_string())
    }
}

impl From<std::io::Error> for FailReason {
    fn from(e: std::io::Error) -> Self {
        FailReason::exception(e)
    }
}

impl From<anyhow::Error> for FailReason {
    fn from(e: anyhow::Error) -> Self {
        // Alternate formatting keeps the context chain in the message.
        FailReason::new(FailKind::Exception, format!("{e:#}"))
    }
}
