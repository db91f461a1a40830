//! Plaintext gRPC client channels
//!
//! For Unix domain sockets and trusted internal networks. Channels are
//! created lazily: no connection is attempted until the first request, so
//! only malformed targets fail here. Both constructors must run inside a
//! tokio runtime.
//!
//! Accepted targets:
//! - `unix:///run/agent.sock`, `unix:relative.sock`
//! - `dns:///host:port`, `host:port`
//! - `http://host:port`

use std::path::PathBuf;
use std::str::FromStr;
use tonic::transport::{Channel, Endpoint};

use crate::errors::{exit_code, Result, SvcError};
use crate::logging::LogGuard;

/// Where a channel connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrpcTarget {
    /// `http://` URI for a TCP endpoint.
    Tcp(String),
    Unix(PathBuf),
}

impl FromStr for GrpcTarget {
    type Err = SvcError;

    fn from_str(target: &str) -> Result<Self> {
        let invalid = |message: &str| SvcError::InvalidTarget {
            target: target.to_string(),
            message: message.to_string(),
        };

        let trimmed = target.trim();
        if trimmed.is_empty() {
            return Err(invalid("target is empty"));
        }

        if let Some(rest) = trimmed.strip_prefix("unix:") {
            // unix:///abs/path keeps its leading slash, unix:rel stays relative
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(invalid("unix socket path is empty"));
            }
            return Ok(GrpcTarget::Unix(PathBuf::from(path)));
        }

        if trimmed.starts_with("https://") {
            return Err(invalid("TLS targets are not supported by insecure channels"));
        }

        let authority = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("dns:///"))
            .unwrap_or(trimmed);
        if authority.is_empty() {
            return Err(invalid("host is empty"));
        }
        Ok(GrpcTarget::Tcp(format!("http://{}", authority)))
    }
}

/// Lazily connecting channel to `target` without transport security.
pub fn insecure_channel(target: &str) -> Result<Channel> {
    match target.parse::<GrpcTarget>()? {
        GrpcTarget::Tcp(uri) => {
            let endpoint = Endpoint::from_shared(uri)?;
            Ok(endpoint.connect_lazy())
        }
        GrpcTarget::Unix(path) => unix_channel(path),
    }
}

#[cfg(unix)]
fn unix_channel(path: PathBuf) -> Result<Channel> {
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;
    use tonic::transport::Uri;
    use tower::service_fn;

    // The authority is ignored, the connector always dials the socket.
    let endpoint = Endpoint::from_static("http://localhost");
    Ok(endpoint.connect_with_connector_lazy(service_fn(move |_: Uri| {
        let path = path.clone();
        async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?)) }
    })))
}

#[cfg(not(unix))]
fn unix_channel(path: PathBuf) -> Result<Channel> {
    Err(SvcError::InvalidTarget {
        target: path.display().to_string(),
        message: "unix sockets are not supported on this platform".to_string(),
    })
}

/// Like [`insecure_channel`], but logs the error and exits the process when
/// the target is unusable.
///
/// `process::exit` runs no destructors, so a file logger's guard is taken
/// out of `log_guard` and dropped first to flush the error line to disk.
/// Pass `&mut None` when logging to stdout only.
pub fn insecure_channel_or_exit(target: &str, log_guard: &mut Option<LogGuard>) -> Channel {
    match insecure_channel(target) {
        Ok(channel) => channel,
        Err(e) => std::process::exit(report_fatal(target, &e, log_guard)),
    }
}

/// Log a fatal channel error, flush file logging and return the exit status.
fn report_fatal(target: &str, err: &SvcError, log_guard: &mut Option<LogGuard>) -> i32 {
    tracing::error!(target_addr = target, error = %err, "failed to connect to gRPC socket");
    drop(log_guard.take());
    exit_code(err)
}
