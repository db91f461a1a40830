use std::path::PathBuf;
use thiserror::Error;

/// The error type shared by every svckit module.
///
/// The ring buffer itself only ever produces `InvalidCapacity`; its routine
/// empty/full conditions are reported through `Option` and `Result<(), T>`
/// return values instead.
#[derive(Error, Debug)]
pub enum SvcError {
    #[error("Ring buffer capacity must be greater than zero")]
    InvalidCapacity,

    #[error("Invalid log level: {0:?}")]
    InvalidLogLevel(String),

    #[error("Failed to load config from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Invalid gRPC target '{target}': {message}")]
    InvalidTarget { target: String, message: String },

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SvcError>;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Determine the appropriate process exit code for an error.
pub fn exit_code(e: &SvcError) -> i32 {
    match e {
        SvcError::InvalidLogLevel(_) | SvcError::ConfigLoad { .. } | SvcError::InvalidTarget { .. } => {
            EXIT_CONFIG_ERROR
        }
        _ => EXIT_ERROR,
    }
}
