use std::path::PathBuf;

/// Generate a UTC timestamp for run manifests
/// Returns format: YYYY-MM-DDTHH:MM:SSZ
pub fn generate_utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Get the Kestrel home directory
/// Checks KESTREL_HOME environment variable, falls back to ${HOME}/.kestrel
pub fn kestrel_home() -> PathBuf {
    if let Ok(path) = std::env::var("KESTREL_HOME") {
        PathBuf::from(path)
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| {
            std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string())
        });
        PathBuf::from(home).join(".kestrel")
    }
}

/// Get the user config file path
/// Checks KESTREL_CONFIG environment variable, falls back to KESTREL_HOME/config.toml
pub fn kestrel_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("KESTREL_CONFIG") {
        PathBuf::from(path)
    } else {
        kestrel_home().join("config.toml")
    }
}

/// Get the directory searched for locally installed aligners
/// Checks KESTREL_TOOLS_DIR environment variable, falls back to KESTREL_HOME/tools
pub fn kestrel_tools_dir() -> PathBuf {
    if let Ok(path) = std::env::var("KESTREL_TOOLS_DIR") {
        PathBuf::from(path)
    } else {
        kestrel_home().join("tools")
    }
}
