//! User configuration (`~/.winup/config.toml`).
//!
//! Every key is optional. A missing file means defaults; a file that does not
//! parse is an error rather than being silently ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Paths of the native tools winup drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub dism: PathBuf,
    pub wusa: PathBuf,
    pub pnputil: PathBuf,
    pub powershell: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            dism: "dism.exe".into(),
            wusa: "wusa.exe".into(),
            pnputil: "pnputil.exe".into(),
            powershell: "powershell.exe".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on a single standalone installer run.
    pub standalone_timeout_secs: u64,
    /// Substring that selects servicing-package registry keys for the
    /// secondary name index.
    pub secondary_index_filter: String,
    pub tools: Tools,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            standalone_timeout_secs: winup_core::DEFAULT_STANDALONE_TIMEOUT.as_secs(),
            secondary_index_filter: "RollupFix".to_string(),
            tools: Tools::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the winup home, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match winup_core::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.standalone_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "standalone_timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(config)
    }

    pub fn standalone_timeout(&self) -> Duration {
        Duration::from_secs(self.standalone_timeout_secs)
    }
}
