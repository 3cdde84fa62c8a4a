//! High-level client for the remote-system-monitor collector protocol.
//!
//! [`Client::connect`] dials a collector, verifies it speaks a compatible
//! wire version, fetches the host's machine info and an initial snapshot,
//! and installs the `update_data` notification handler that streams every
//! subsequent sample to the embedder. The core does not implement automatic
//! reconnect — on an unexpected disconnect the embedder's `on_disconnect`
//! callback fires, and reconnecting (if desired) means calling
//! [`Client::connect`] again.

pub mod client;
pub mod error;

pub use client::{Client, NewDataHandler, CONNECT_TIMEOUT, MIN_API_VERSION};
pub use error::{ClientError, ClientResult};
