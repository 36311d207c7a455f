use dirs::home_dir;
use std::path::PathBuf;

/// Returns the winup directory, or None if the user's home cannot be resolved.
pub fn try_winup_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("WINUP_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".winup"))
}

/// Configuration file: ~/.winup/config.toml
pub fn config_path() -> Option<PathBuf> {
    try_winup_home().map(|h| h.join("config.toml"))
}
