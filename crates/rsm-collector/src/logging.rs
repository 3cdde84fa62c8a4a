//! Logging initialization for the collector binary.
//!
//! The collector never runs as a stdio-framed transport the way an MCP
//! server can, so there is no risk of log lines colliding with a protocol
//! channel — stderr-only, no file rotation, no guard to hold.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr `tracing` subscriber filtered at `level`, or by
/// `RUST_LOG` if it's set (which always takes precedence).
pub fn init_logging(level: tracing::level_filters::LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
