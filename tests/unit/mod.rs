//! Unit tests for svckit modules
//!
//! These tests exercise the public API the way a service would, without
//! network I/O.

mod test_cli;
mod test_logging;
mod test_pipeline;
