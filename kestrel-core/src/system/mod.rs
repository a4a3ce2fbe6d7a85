//! System-level utilities for Kestrel

pub mod fs;
pub mod paths;

pub use fs::{commit_all, file_sha256, write_atomic, StagedFile};
pub use paths::{generate_utc_timestamp, kestrel_config_path, kestrel_home, kestrel_tools_dir};
