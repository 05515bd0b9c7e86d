//! Default path helpers and symlink checks.
//! Resolves the config file (env override first), and places the log file next
//! to it. The record store defaults to the platform data dir.

use anyhow::{Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{APP_DIR, CONFIG_ENV, LOG_FILE_NAME, STORE_FILE_NAME};

fn home_fallback(parts: &[&str]) -> Result<PathBuf> {
    let home = env::var_os("HOME").ok_or_else(|| anyhow!("HOME is not set"))?;
    Ok(parts.iter().fold(PathBuf::from(home), |p, s| p.join(s)))
}

/// `$DL_RELOCATE_CONFIG` if set, otherwise `<config_dir>/dl_relocate/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    match config_dir() {
        Some(base) => Ok(base.join(APP_DIR).join("config.xml")),
        None => home_fallback(&[".config", APP_DIR, "config.xml"]),
    }
}

/// Log file colocated with the resolved config file.
pub fn default_log_path() -> Result<PathBuf> {
    let cfg = default_config_path()?;
    let dir = cfg
        .parent()
        .ok_or_else(|| anyhow!("config path has no parent: {}", cfg.display()))?;
    Ok(dir.join(LOG_FILE_NAME))
}

/// `<data_dir>/dl_relocate/records.json`.
pub fn default_store_path() -> Result<PathBuf> {
    match data_dir() {
        Some(base) => Ok(base.join(APP_DIR).join(STORE_FILE_NAME)),
        None => home_fallback(&[".local", "share", APP_DIR, STORE_FILE_NAME]),
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if let Ok(meta) = fs::symlink_metadata(anc)
            && meta.file_type().is_symlink()
        {
            return Ok(true);
        }
        p = anc.parent();
    }
    Ok(false)
}
