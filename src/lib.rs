//! svckit - shared building blocks for small services
//!
//! - **Ring buffer**: bounded, thread-safe FIFO that overwrites the oldest
//!   entry when full and lets consumers put a failed item back at the head
//! - **Logging**: JSON logs to stdout and size-rotated files
//! - **Flags**: clap argument groups for logging configuration
//! - **gRPC**: plaintext client channels over TCP or Unix sockets
//! - **Tasks**: spawn tokio tasks and wait for all of them
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use svckit::{cli::LogStdArgs, logging, task::TaskGroup, RingBuffer};
//!
//! logging::setup_std_logger(&args.log.into_config())?;
//!
//! let buf = Arc::new(RingBuffer::new(1024));
//! let group = TaskGroup::new();
//! let producer = Arc::clone(&buf);
//! group.spawn(async move { producer.add(read_sample().await) });
//! group.wait().await;
//! ```

// ─── Core ──────────────────────────────────────────────────────────
pub mod errors;
pub mod ring_buffer;

// ─── Service plumbing ──────────────────────────────────────────────
pub mod cli;
pub mod config;
pub mod grpc;
pub mod logging;
pub mod task;

pub use errors::{Result, SvcError};
pub use ring_buffer::RingBuffer;
