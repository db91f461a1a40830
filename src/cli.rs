//! Command-line flag groups
//!
//! Each group is a clap `Args` struct meant to be flattened into a
//! service's own parser; after parsing, `into_config` turns it into the
//! matching config struct.
//!
//! ```
//! use clap::Parser;
//! use svckit::cli::LogStdAndFileArgs;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     log: LogStdAndFileArgs,
//! }
//!
//! let cli = Cli::parse_from(["collector", "--log-max-size", "50"]);
//! let cfg = cli.log.into_config("collector");
//! assert_eq!(cfg.log_max_size, 50);
//! ```

use clap::{ArgAction, Args};
use std::path::PathBuf;

use crate::config::{default_log_file, LogStdAndFileConfig, LogStdConfig};

/// `--log-level` for services that only log to stdout.
#[derive(Debug, Clone, Args)]
pub struct LogStdArgs {
    /// Set log level
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

impl LogStdArgs {
    pub fn into_config(self) -> LogStdConfig {
        LogStdConfig {
            log_level: self.log_level,
        }
    }
}

/// Flags for stdout plus rotating-file logging.
#[derive(Debug, Clone, Args)]
pub struct LogStdAndFileArgs {
    /// Set log level
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Path to log file [default: /var/log/svckit/<app>.log]
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Maximum log size (MB)
    #[arg(long = "log-max-size", value_name = "MB", default_value_t = 10)]
    pub log_max_size: u64,

    /// Max backup files
    #[arg(long = "log-max-backups", value_name = "N", default_value_t = 5)]
    pub log_max_backups: usize,

    /// Max age in days
    #[arg(long = "log-max-age", value_name = "DAYS", default_value_t = 30)]
    pub log_max_age: u64,

    /// Compress logs
    #[arg(
        long = "log-compress",
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub log_compress: bool,
}

impl LogStdAndFileArgs {
    /// Resolve the parsed flags; `app_name` picks the default log file.
    pub fn into_config(self, app_name: &str) -> LogStdAndFileConfig {
        LogStdAndFileConfig {
            log_level: self.log_level,
            log_file: self.log_file.unwrap_or_else(|| default_log_file(app_name)),
            log_max_size: self.log_max_size,
            log_max_backups: self.log_max_backups,
            log_max_age: self.log_max_age,
            log_compress: self.log_compress,
        }
    }
}
