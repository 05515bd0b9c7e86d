//! Configuration: types, default locations, XML loading and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, default_store_path, path_has_symlink_ancestor};
pub use types::{Config, DispatchMode, LogLevel};
pub use xml::{LoadResult, create_template_config, load_config_from_xml_path, load_or_init};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DL_RELOCATE_CONFIG";
/// Application directory name under the platform config/data dirs.
pub const APP_DIR: &str = "dl_relocate";
pub const STORE_FILE_NAME: &str = "records.json";
pub const LOG_FILE_NAME: &str = "dl_relocate.log";
