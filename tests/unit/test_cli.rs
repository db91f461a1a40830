//! Unit tests for flag groups and config loading
//!
//! Tests cover:
//! - Flattening the logging flag groups into a service parser
//! - Conversion to config structs
//! - TOML config files

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use svckit::cli::{LogStdAndFileArgs, LogStdArgs};
use svckit::config::{self, LogStdAndFileConfig, LogStdConfig};

#[derive(Parser)]
#[command(name = "collector")]
struct CollectorCli {
    #[command(flatten)]
    log: LogStdAndFileArgs,

    /// Ring buffer capacity
    #[arg(long, default_value_t = 128)]
    capacity: usize,
}

#[derive(Parser)]
#[command(name = "probe")]
struct ProbeCli {
    #[command(flatten)]
    log: LogStdArgs,
}

#[test]
fn test_flattened_flags_coexist_with_service_flags() {
    let cli = CollectorCli::try_parse_from([
        "collector",
        "--capacity",
        "64",
        "--log-level",
        "error",
    ])
    .unwrap();
    assert_eq!(cli.capacity, 64);
    let cfg = cli.log.into_config("collector");
    assert_eq!(cfg.log_level, "error");
    assert_eq!(cfg.log_file, PathBuf::from("/var/log/svckit/collector.log"));
}

#[test]
fn test_log_compress_toggle() {
    let on = CollectorCli::try_parse_from(["collector"]).unwrap();
    assert!(on.log.log_compress);

    let off = CollectorCli::try_parse_from(["collector", "--log-compress", "false"]).unwrap();
    assert!(!off.log.log_compress);
}

#[test]
fn test_unknown_flag_is_rejected() {
    assert!(ProbeCli::try_parse_from(["probe", "--log-file", "/tmp/x"]).is_err());
}

#[test]
fn test_std_args_to_config() {
    let cli = ProbeCli::try_parse_from(["probe", "--log-level=debug"]).unwrap();
    assert_eq!(
        cli.log.into_config(),
        LogStdConfig {
            log_level: "debug".into()
        }
    );
}

#[test]
fn test_toml_round_trip_matches_flags() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
log_level = "warn"
log_file = "/srv/collector/out.log"
log_max_size = 25
log_compress = false
"#
    )
    .unwrap();

    let from_file: LogStdAndFileConfig = config::load(file.path()).unwrap();
    let from_flags = CollectorCli::try_parse_from([
        "collector",
        "--log-level",
        "warn",
        "--log-file",
        "/srv/collector/out.log",
        "--log-max-size",
        "25",
        "--log-compress=false",
    ])
    .unwrap()
    .log
    .into_config("collector");

    assert_eq!(from_file, from_flags);
}
