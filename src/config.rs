use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::LogLevel;

const CONFIG_DIR: &str = "entity-http-client";
const CONFIG_FILE: &str = "config.json";

/// Errors raised while loading a [`ClientConfig`] file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Transport settings shared by every request a service executes.
///
/// Every key is optional in the file; missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connect and read timeout for a single request.
    pub timeout_seconds: u64,
    /// Sent as `Accept-Charset`.
    pub charset: String,
    /// `Content-Type` of JSON request bodies.
    pub content_type: String,
    pub user_agent: String,
    pub log_level: LogLevel,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout_seconds: 10,
            charset: "utf-8".to_string(),
            content_type: "application/json;charset=utf-8".to_string(),
            user_agent: concat!("entity-http-client/", env!("CARGO_PKG_VERSION")).to_string(),
            log_level: LogLevel::default(),
        }
    }
}

impl ClientConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `entity-http-client/config.json` from the user's config directory,
    /// or return the defaults when there is none.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Default timeout for a request, as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Location [`ClientConfig::load_default`] reads from.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
