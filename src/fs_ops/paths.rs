//! Path computation and filesystem preconditions for a relocation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::helpers::io_error_with_help_io;
use crate::record::DownloadRecord;

/// Old and new location of a record's on-disk file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPaths {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A completed download lives under `file_name`, anything else under `temp_file_name`;
/// the same name is used on both sides of the move.
pub fn relocation_paths(record: &DownloadRecord, destination_dir: &Path) -> RelocationPaths {
    let name = record.current_file_name();
    RelocationPaths {
        from: Path::new(&record.file_dir).join(name),
        to: destination_dir.join(name),
    }
}

/// True when `path` is a regular file. Symlinks are not followed.
pub fn source_is_regular_file(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error_with_help_io("stat source", path)(e)),
    }
}

/// True when anything (file, directory, even a dangling symlink) occupies `path`.
pub fn target_exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error_with_help_io("stat target", path)(e)),
    }
}

/// Create `dir` and its parents when missing. An existing non-directory is an error.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %dir.display(), "destination directory present");
            Ok(())
        }
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination '{}' exists but is not a directory", dir.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir)
                .map_err(io_error_with_help_io("create destination directory", dir))?;
            info!(path = %dir.display(), "Created destination directory");
            Ok(())
        }
        Err(e) => Err(io_error_with_help_io("stat destination directory", dir)(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DownloadStatus;
    use assert_fs::prelude::*;

    #[test]
    fn completed_uses_final_name() {
        let r = DownloadRecord::new("u", "/old", "x.mp4", DownloadStatus::Completed);
        let p = relocation_paths(&r, Path::new("/new"));
        assert_eq!(p.from, PathBuf::from("/old/x.mp4"));
        assert_eq!(p.to, PathBuf::from("/new/x.mp4"));
    }

    #[test]
    fn paused_uses_temp_name() {
        let r = DownloadRecord::new("u", "/old", "x.mp4", DownloadStatus::Paused);
        let p = relocation_paths(&r, Path::new("/new"));
        assert_eq!(p.from, PathBuf::from("/old/x.mp4.temp"));
        assert_eq!(p.to, PathBuf::from("/new/x.mp4.temp"));
    }

    #[test]
    fn directory_is_not_a_source_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let sub = dir.child("sub");
        sub.create_dir_all().unwrap();
        assert!(!source_is_regular_file(sub.path()).unwrap());
        assert!(target_exists(sub.path()).unwrap());
        assert!(!source_is_regular_file(&dir.path().join("missing")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_counts_as_target() {
        let dir = assert_fs::TempDir::new().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();
        assert!(target_exists(&link).unwrap());
        assert!(!source_is_regular_file(&link).unwrap());
    }

    #[test]
    fn ensure_dir_creates_parents_and_rejects_files() {
        let dir = assert_fs::TempDir::new().unwrap();
        let deep = dir.path().join("a").join("b");
        ensure_dir(&deep).unwrap();
        assert!(deep.is_dir());
        ensure_dir(&deep).unwrap();

        let file = dir.child("plain");
        file.touch().unwrap();
        let err = ensure_dir(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }
}
