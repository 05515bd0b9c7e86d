//! CLI definition and parsing.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug and wins over it.
//! - CLI flags override values from config.xml.

use clap::{Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, DispatchMode, LogLevel};

/// Relocate downloads recorded in a JSON store into another directory.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Move downloaded files and keep their records in step"
)]
pub struct Args {
    /// Directory to move the files into (created if missing).
    #[arg(
        value_name = "DESTINATION",
        value_hint = ValueHint::DirPath,
        required_unless_present = "print_config"
    )]
    pub destination: Option<PathBuf>,

    /// Download urls whose files should be moved.
    #[arg(value_name = "URL", required_unless_present = "print_config")]
    pub urls: Vec<String>,

    /// Record store to use instead of the configured one.
    #[arg(long, value_hint = ValueHint::FilePath, help = "Override the JSON record store path")]
    pub store: Option<PathBuf>,

    /// Deliver progress callbacks on a dedicated thread instead of inline.
    #[arg(long, help = "Deliver callbacks on a dedicated callback thread")]
    pub marshaled: bool,

    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    #[arg(
        long,
        help = "Print the config file location used by dl_relocate and exit"
    )]
    pub print_config: bool,

    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Destination with shell-quoting leftovers removed.
    pub fn resolved_destination(&self) -> Option<PathBuf> {
        self.destination.as_deref().map(sanitize_path)
    }

    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(store) = &self.store {
            cfg.store_path = sanitize_path(store);
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.marshaled {
            cfg.dispatch_mode = DispatchMode::Marshaled;
        }
    }
}

/// Trim surrounding quotes left behind by PowerShell/CMD quoting and one
/// trailing separator (never the root itself).
fn sanitize_path(p: &Path) -> PathBuf {
    let raw = p.to_string_lossy();
    let mut inner: String = raw
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string();
    if inner.len() > 1 && (inner.ends_with('/') || inner.ends_with('\\')) {
        inner.pop();
    }
    PathBuf::from(inner)
}

pub fn parse() -> Args {
    Args::parse()
}
