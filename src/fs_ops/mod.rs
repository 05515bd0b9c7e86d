//! Filesystem operations used by relocation.

mod atomic;
mod helpers;
mod paths;
mod util;

pub use atomic::try_atomic_move;
pub use helpers::{io_error_with_help, io_error_with_help_io};
pub use paths::{
    RelocationPaths, ensure_dir, relocation_paths, source_is_regular_file, target_exists,
};
pub use util::{fsync_dir, is_cross_device, unique_temp_path};
