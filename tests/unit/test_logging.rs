//! Unit tests for logging setup
//!
//! Tests cover:
//! - JSON output to a rotating file
//! - Rotation through the subscriber
//! - Startup info record

use std::time::Duration;

use serde::Serialize;
use svckit::config::LogStdAndFileConfig;
use svckit::logging::{self, RollingFile, RotationPolicy, StartupInfo};
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> LogStdAndFileConfig {
    LogStdAndFileConfig {
        log_file: dir.path().join("logs/collector.log"),
        log_compress: false,
        ..LogStdAndFileConfig::for_app("collector")
    }
}

fn json_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[derive(Serialize)]
struct PipelineConfig {
    capacity: usize,
    flush_interval: Duration,
}

#[test]
fn test_startup_info_lands_in_file() {
    let dir = TempDir::new().unwrap();
    let cfg = config_in(&dir);
    let (dispatch, guard) = logging::build_std_and_file_logger(&cfg).unwrap();

    tracing::dispatcher::with_default(&dispatch, || {
        StartupInfo::new("collector")
            .config(&cfg)
            .config(&PipelineConfig {
                capacity: 256,
                flush_interval: Duration::from_secs(5),
            })
            .log();
    });
    drop(guard);

    let lines = json_lines(&cfg.log_file);
    let startup = lines
        .iter()
        .find(|l| l["message"] == "collector started")
        .expect("startup line");
    assert_eq!(startup["level"], "INFO");
    assert_eq!(startup["crate_version"], env!("CARGO_PKG_VERSION"));

    let configs: serde_json::Value =
        serde_json::from_str(startup["configs"].as_str().unwrap()).unwrap();
    assert_eq!(configs["PipelineConfig"]["capacity"], 256);
    assert_eq!(configs["PipelineConfig"]["flush_interval"], "5s");
    assert_eq!(configs["LogStdAndFileConfig"]["log_level"], "info");
}

#[test]
fn test_invalid_level_fails_before_touching_disk() {
    let dir = TempDir::new().unwrap();
    let cfg = LogStdAndFileConfig {
        log_level: "shouty".into(),
        ..config_in(&dir)
    };
    assert!(logging::build_std_and_file_logger(&cfg).is_err());
    assert!(!cfg.log_file.exists());
}

#[test]
fn test_rolling_file_through_non_blocking_writer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.log");
    let file = RollingFile::open(
        &path,
        RotationPolicy {
            max_bytes: 256,
            max_backups: 3,
            ..RotationPolicy::default()
        },
    )
    .unwrap();

    let (writer, guard) = tracing_appender::non_blocking(file);
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        for i in 0..50 {
            tracing::info!(seq = i, "sample recorded");
        }
    });
    drop(guard);

    let backups: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n != "raw.log")
        .collect();
    assert_eq!(backups.len(), 3);
    assert!(std::fs::metadata(&path).unwrap().len() <= 256);
}
