//! Default paths for moodbbs components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/moodbbs/config.toml` or `~/.config/moodbbs/config.toml`
//! - Data: `$XDG_DATA_HOME/moodbbs` or `~/.local/share/moodbbs`
//! - Logs: `$XDG_STATE_HOME/moodbbs` or `~/.local/state/moodbbs`

use std::path::PathBuf;

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "moodbbs.db";

/// Application subdirectory name
const APP_DIR: &str = "moodbbs";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

fn home_subdir(parts: &[&str]) -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let mut path = PathBuf::from(home);
    for part in parts {
        path.push(part);
    }
    Some(path.join(APP_DIR))
}

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/moodbbs/config.toml`
/// 2. `~/.config/moodbbs/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    home_subdir(&[".config"])
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR))
        .join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$XDG_DATA_HOME/moodbbs` (if XDG_DATA_HOME is set)
/// 2. `~/.local/share/moodbbs` (fallback)
///
/// The `MOODBBS_DATA_DIR` override is applied by the binary on top of this.
pub fn default_data_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    home_subdir(&[".local", "share"]).unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR).join("data"))
}

/// Get the default log directory.
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    home_subdir(&[".local", "state"]).unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR).join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_ends_with_config_toml() {
        let path = default_config_path();
        assert!(path.ends_with("moodbbs/config.toml"));
    }

    #[test]
    fn data_dir_contains_moodbbs() {
        let path = default_data_dir();
        assert!(path.to_string_lossy().contains("moodbbs"));
    }

    #[test]
    fn log_dir_contains_moodbbs() {
        let path = default_log_dir();
        assert!(path.to_string_lossy().contains("moodbbs"));
    }
}
