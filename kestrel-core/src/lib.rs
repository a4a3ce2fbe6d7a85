//! Core utilities and types shared across all Kestrel crates

pub mod config;
pub mod error;
pub mod system;

// Re-export commonly used types
pub use config::{load_config, load_effective_config, save_config, Alphabet, Config};
pub use error::{KestrelError, KestrelResult};

// Re-export system utilities
pub use system::{
    commit_all, file_sha256, generate_utc_timestamp, kestrel_config_path, kestrel_home,
    kestrel_tools_dir, write_atomic, StagedFile,
};

/// Version information for the Kestrel project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
