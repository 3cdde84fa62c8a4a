//! Wire types for the remote-system-monitor JSON-RPC 2.0 protocol.
//!
//! This crate has no I/O of its own: it is pure data — the JSON-RPC
//! envelope ([`jsonrpc`]), the host-telemetry payloads ([`domain`]), and the
//! tolerant legacy-format decoder ([`legacy`]) that the protocol spec
//! requires clients to support.

pub mod domain;
pub mod error;
pub mod jsonrpc;
pub mod legacy;

pub use domain::{
    ApiInfo, DiskUsage, IoCounters, LoadAverage, MachineInfo, MemoryInfo, SensorData,
    API_SENTINEL_ID, API_VERSION,
};
pub use error::{WireError, WireResult};
pub use jsonrpc::{
    ErrorObject, JsonRpcVersion, NotificationMessage, RequestId, RequestMessage, Response,
    ResponseId, JSONRPC_VERSION,
};
