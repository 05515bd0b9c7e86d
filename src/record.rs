//! Download record model.
//! The persisted description of a download: where its file lives, what it is
//! called while in progress and once complete, and which lifecycle state it is in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle state of a download as stored in its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Waiting,
    Retrying,
    Preparing,
    Prepared,
    Downloading,
    Paused,
    Stopped,
    Completed,
    Error,
    FileNotExist,
}

impl DownloadStatus {
    /// Only finished or idle (paused/stopped) downloads may have their file moved.
    pub fn is_movable(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Completed | DownloadStatus::Paused | DownloadStatus::Stopped
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DownloadStatus::Completed)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DownloadStatus::Waiting => "waiting",
            DownloadStatus::Retrying => "retrying",
            DownloadStatus::Preparing => "preparing",
            DownloadStatus::Prepared => "prepared",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Paused => "paused",
            DownloadStatus::Stopped => "stopped",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Error => "error",
            DownloadStatus::FileNotExist => "file_not_exist",
        };
        f.write_str(s)
    }
}

/// Metadata record for one download, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub url: String,
    /// Directory currently believed to hold the file.
    pub file_dir: String,
    /// Final name, used once the download is complete.
    pub file_name: String,
    /// Name used while the download is still in progress.
    pub temp_file_name: String,
    pub status: DownloadStatus,
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub downloaded_size: u64,
}

impl DownloadRecord {
    /// Record with the conventional `<name>.temp` in-progress file name.
    pub fn new(
        url: impl Into<String>,
        file_dir: impl Into<String>,
        file_name: impl Into<String>,
        status: DownloadStatus,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            url: url.into(),
            file_dir: file_dir.into(),
            temp_file_name: format!("{file_name}.temp"),
            file_name,
            status,
            total_size: 0,
            downloaded_size: 0,
        }
    }

    /// Name of the file that is actually on disk for the current status.
    pub fn current_file_name(&self) -> &str {
        if self.status.is_completed() {
            &self.file_name
        } else {
            &self.temp_file_name
        }
    }

    /// Full path of the on-disk file according to this record.
    pub fn current_path(&self) -> PathBuf {
        PathBuf::from(&self.file_dir).join(self.current_file_name())
    }
}
