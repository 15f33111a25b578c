//! Logging setup for Warden binaries and tests
//!
//! Library crates only emit events through `tracing` (or `log`, which the
//! installed subscriber also captures); this crate turns a
//! [`LoggingConfig`](warden_config::LoggingConfig) into a global subscriber.

mod init;

pub use init::{init_logging_from_config, init_simple_tracing};
