//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Unknown fields are a hard error so typos don't silently fall back to defaults.
//! - Writes a commented template on first run when the default location is empty.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{default_config_path, default_store_path, path_has_symlink_ancestor};
use super::types::{Config, DispatchMode, LogLevel};
use super::CONFIG_ENV;

#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    store_path: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    callback_mode: Option<String>,
}

/// Outcome of `load_or_init`.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(Config),
    /// No config existed at the default location; a template was written there.
    CreatedTemplate(PathBuf),
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn xml_to_config(parsed: XmlConfig, source: &Path) -> Result<Config> {
    let mut cfg = Config::default();
    if let Some(p) = non_empty(parsed.store_path.as_deref()) {
        cfg.store_path = PathBuf::from(p);
    }
    if let Some(p) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(p));
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s
            .parse::<LogLevel>()
            .map_err(|e| anyhow!("{e} in {}", source.display()))?;
    }
    if let Some(s) = non_empty(parsed.callback_mode.as_deref()) {
        cfg.dispatch_mode = s
            .parse::<DispatchMode>()
            .map_err(|e| anyhow!("{e} in {}", source.display()))?;
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded config xml");
    xml_to_config(parsed, path)
}

/// Resolve the config file and load it.
///
/// A missing file named by `$DL_RELOCATE_CONFIG` is an error; a missing file at
/// the default location gets a template and `LoadResult::CreatedTemplate`.
pub fn load_or_init() -> Result<LoadResult> {
    let path = default_config_path()?;
    if path.exists() {
        return load_config_from_xml_path(&path).map(LoadResult::Loaded);
    }
    if env::var_os(CONFIG_ENV).is_some() {
        bail!("{CONFIG_ENV} points at a missing file: {}", path.display());
    }
    create_template_config(&path)?;
    Ok(LoadResult::CreatedTemplate(path))
}

/// Write a commented template config. Refuses symlinked ancestors and never
/// replaces an existing file.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory '{}'", parent.display()))?;
    }

    let store = default_store_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/records.json".into());
    let content = format!(
        "<!--\n  dl_relocate configuration (XML)\n\n    store_path     -> JSON record store to relocate downloads in\n    log_level      -> quiet | normal | info | debug\n    log_file       -> optional log file (stdout is always used)\n    callback_mode  -> inline | marshaled\n\n  CLI flags override these values.\n-->\n<config>\n  <store_path>{store}</store_path>\n  <log_level>normal</log_level>\n  <log_file></log_file>\n  <callback_mode>inline</callback_mode>\n</config>\n"
    );

    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut f = opts
        .open(path)
        .with_context(|| format!("create template config '{}'", path.display()))?;
    f.write_all(content.as_bytes())?;
    f.sync_all()?;

    info!("Created template config at {}", path.display());
    Ok(())
}
