//! I/O error enrichment.
//!
//! Adapters that turn a bare `io::Error` into one naming the operation, the path
//! and a short actionable hint. Usable with `map_err` in both anyhow and io code:
//!
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;
//!   fs::rename(a, b).map_err(io_error_with_help_io("rename", a))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

#[cfg(unix)]
fn os_hint(code: i32) -> Option<&'static str> {
    let hint = match code {
        libc::EACCES | libc::EPERM => "permission denied; check ownership and write permissions",
        libc::EXDEV => "cross-filesystem; relocation requires source and destination on one volume",
        libc::EBUSY => "resource busy; ensure no other process is writing",
        libc::ENOENT => "path not found; verify it exists",
        libc::EEXIST => "already exists; relocation never overwrites",
        libc::EISDIR => "destination is a directory",
        libc::ENOTEMPTY => "destination is a non-empty directory",
        libc::ENOSPC => "insufficient space on device",
        libc::EROFS => "read-only filesystem",
        libc::ENAMETOOLONG => "filename or path too long",
        _ => return None,
    };
    Some(hint)
}

#[cfg(windows)]
fn os_hint(code: i32) -> Option<&'static str> {
    let hint = match code {
        5 => "access denied; check permissions",
        17 => "not same device; relocation requires one volume",
        32 => "sharing violation; file is in use",
        2 | 3 => "path not found; verify it exists",
        80 | 183 => "already exists; relocation never overwrites",
        112 => "insufficient disk space",
        206 => "filename or path too long",
        _ => return None,
    };
    Some(hint)
}

#[cfg(not(any(unix, windows)))]
fn os_hint(_code: i32) -> Option<&'static str> {
    None
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; relocation never overwrites"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    match e.raw_os_error() {
        Some(code) => {
            if let Some(h) = os_hint(code) {
                msg.push_str("; ");
                msg.push_str(h);
            }
            msg.push_str(&format!(" [os code: {code}]"));
        }
        None => {
            if let Some(h) = kind_hint(e.kind()) {
                msg.push_str("; ");
                msg.push_str(h);
            }
        }
    }
    msg
}

/// `io::Error -> anyhow::Error` with op/path context.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// `io::Error -> io::Error` with op/path context; the original `ErrorKind` is kept.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}
