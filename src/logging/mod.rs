//! Structured logging setup
//!
//! Services log JSON lines (`timestamp`, `level`, `message`, `target` and
//! the event's own fields) to stdout, and optionally to a size-rotated file
//! as well. Features:
//! - Level names accepted from flags and config files (`debug`, `info`, ...)
//! - `RUST_LOG` directives override the configured level when set
//! - File output goes through a non-blocking worker; keep the returned
//!   [`LogGuard`] alive so buffered lines are flushed on shutdown
//!
//! The `build_*` functions return a [`Dispatch`] without installing it,
//! the `setup_*` functions install it as the global default.

pub mod rolling;
pub mod startup;

pub use rolling::{RollingFile, RotationPolicy};
pub use startup::StartupInfo;

use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, time::ChronoUtc, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogStdAndFileConfig, LogStdConfig};
use crate::errors::{Result, SvcError};

/// Keeps the file-writing worker alive; dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Parse a level name as used in flags and config files.
///
/// Empty input means `info`. The severities above `error` that some
/// loggers distinguish (`dpanic`, `panic`, `fatal`) map to `ERROR`.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "" | "info" => Ok(LevelFilter::INFO),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "dpanic" | "panic" | "fatal" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(SvcError::InvalidLogLevel(level.to_string())),
    }
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    let level = parse_level(level)?;
    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy())
}

fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer)
}

/// JSON logger writing to stdout only.
pub fn build_std_logger(cfg: &LogStdConfig) -> Result<Dispatch> {
    let subscriber = tracing_subscriber::registry()
        .with(env_filter(&cfg.log_level)?)
        .with(json_layer(std::io::stdout));
    Ok(Dispatch::new(subscriber))
}

/// JSON logger writing to stdout and to the rotating file in `cfg`.
pub fn build_std_and_file_logger(cfg: &LogStdAndFileConfig) -> Result<(Dispatch, LogGuard)> {
    let filter = env_filter(&cfg.log_level)?;
    let file = RollingFile::open(&cfg.log_file, RotationPolicy::from_config(cfg)).map_err(|e| {
        SvcError::Logging(format!(
            "failed to open log file {}: {}",
            cfg.log_file.display(),
            e
        ))
    })?;
    let (writer, worker) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer(writer))
        .with(json_layer(std::io::stdout));
    Ok((Dispatch::new(subscriber), LogGuard { _worker: worker }))
}

fn install(dispatch: Dispatch) -> Result<()> {
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| SvcError::Logging(format!("failed to install global logger: {}", e)))
}

/// Build the stdout logger and install it process-wide.
pub fn setup_std_logger(cfg: &LogStdConfig) -> Result<()> {
    install(build_std_logger(cfg)?)?;
    tracing::debug!(level = %cfg.log_level, "Logging initialized");
    Ok(())
}

/// Build the stdout + file logger and install it process-wide.
pub fn setup_std_and_file_logger(cfg: &LogStdAndFileConfig) -> Result<LogGuard> {
    let (dispatch, guard) = build_std_and_file_logger(cfg)?;
    install(dispatch)?;
    tracing::debug!(
        level = %cfg.log_level,
        log_file = %cfg.log_file.display(),
        "Logging initialized"
    );
    Ok(guard)
}
