use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Result, SvcError};

/// Logging to standard output only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStdConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Logging to standard output and to a size-rotated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStdAndFileConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub log_file: PathBuf,
    /// Megabytes before the file is rotated.
    #[serde(default = "default_log_max_size")]
    pub log_max_size: u64,
    /// Rotated files to keep, 0 keeps all of them.
    #[serde(default = "default_log_max_backups")]
    pub log_max_backups: usize,
    /// Days to keep rotated files, 0 disables age-based removal.
    #[serde(default = "default_log_max_age")]
    pub log_max_age: u64,
    #[serde(default = "default_log_compress")]
    pub log_compress: bool,
}

impl Default for LogStdConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl LogStdAndFileConfig {
    /// Defaults for an application, logging to `/var/log/svckit/<app>.log`.
    pub fn for_app(app_name: &str) -> Self {
        Self {
            log_level: default_log_level(),
            log_file: default_log_file(app_name),
            log_max_size: default_log_max_size(),
            log_max_backups: default_log_max_backups(),
            log_max_age: default_log_max_age(),
            log_compress: default_log_compress(),
        }
    }
}

/// Shared directory for every service built on this crate.
pub const DEFAULT_LOG_DIR: &str = "/var/log/svckit";

pub fn default_log_file(app_name: &str) -> PathBuf {
    Path::new(DEFAULT_LOG_DIR).join(format!("{}.log", app_name))
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_max_size() -> u64 { 10 }
fn default_log_max_backups() -> usize { 5 }
fn default_log_max_age() -> u64 { 30 }
fn default_log_compress() -> bool { true }

/// Load any config struct from a TOML file.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| SvcError::ConfigLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| SvcError::ConfigLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
