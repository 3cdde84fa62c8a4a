//! The collector side of the remote-system-monitor protocol: a fixed-cadence
//! [`pipeline::SamplingPipeline`] feeding a [`broadcaster::Broadcaster`], and
//! a [`server::Server`] that accepts WebSocket connections and registers the
//! three collector request handlers on each.
//!
//! Sampling internals (what `/proc`, `statvfs`, or a platform counter API
//! actually returns) are out of scope — [`metrics_source::MetricsSource`] is
//! the pluggable boundary this crate depends on instead.

pub mod broadcaster;
pub mod logging;
pub mod machine_info;
pub mod metrics_source;
pub mod pipeline;
pub mod server;

pub use broadcaster::Broadcaster;
pub use machine_info::generate_machine_info;
pub use metrics_source::{FixedMetricsSource, MetricsSource};
pub use pipeline::{SamplingPipeline, DEFAULT_SCAN_INTERVAL};
pub use server::{Server, ServerConfig};
