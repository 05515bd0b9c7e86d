//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel and DispatchMode parse from config/CLI strings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    #[default]
    Normal,
    /// Per-step detail
    Info,
    Debug,
}

impl LogLevel {
    /// Case-insensitive; accepts a few common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// How listener callbacks are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// On the relocating thread.
    #[default]
    Inline,
    /// Posted to a dedicated callback thread.
    Marshaled,
}

impl DispatchMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "sync" => Some(DispatchMode::Inline),
            "marshaled" | "marshalled" | "async" => Some(DispatchMode::Marshaled),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchMode::Inline => "inline",
            DispatchMode::Marshaled => "marshaled",
        })
    }
}

impl FromStr for DispatchMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid callback mode: '{s}'"))
    }
}

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON record store to operate on
    pub store_path: PathBuf,
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    pub dispatch_mode: DispatchMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: paths::default_store_path()
                .unwrap_or_else(|_| PathBuf::from(super::STORE_FILE_NAME)),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
            dispatch_mode: DispatchMode::Inline,
        }
    }
}

impl Config {
    /// Config for `store_path`; other fields use defaults.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            ..Default::default()
        }
    }
}
