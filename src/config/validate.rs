//! Config validation.
//! The store file must be a file (or creatable), and so must the log file.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::types::Config;

impl Config {
    /// Check the configured paths, creating the store's parent directory if needed.
    pub fn validate(&self) -> Result<()> {
        ensure_file_slot(&self.store_path, "store_path")?;
        if let Some(log) = &self.log_file {
            if log.is_dir() {
                bail!("log_file is a directory: {}", log.display());
            }
        }
        info!(
            store = %self.store_path.display(),
            log_file = %self
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into()),
            callbacks = %self.dispatch_mode,
            "Config validated"
        );
        Ok(())
    }
}

/// `path` must be a regular file or absent with a parent we can create.
fn ensure_file_slot(path: &Path, name: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("{name} is empty");
    }
    if path.is_dir() {
        bail!("{name} is a directory: {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent of {name} '{}'", parent.display())
            })?;
            info!("Created directory for {name}: {}", parent.display());
        } else if !parent.is_dir() {
            bail!("parent of {name} is not a directory: {}", parent.display());
        }
    }
    debug!("{name} usable: {}", path.display());
    Ok(())
}
