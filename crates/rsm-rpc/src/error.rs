//! Failures an [`crate::Engine`] can raise on the outbound (caller) side.
//!
//! Protocol errors observed on the wire never panic or bubble as Rust
//! errors on the inbound path — they become [`rsm_wire::ErrorObject`]
//! responses sent back to the peer. This enum only covers the caller's view
//! of `call_method`/`send_notification`.

use thiserror::Error;

use rsm_wire::ErrorObject;

/// Failure modes for outbound calls.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The underlying transport could not carry the frame.
    #[error(transparent)]
    Transport(#[from] rsm_transport::TransportError),

    /// The peer answered with a JSON-RPC error object.
    #[error("remote error: {0}")]
    Remote(ErrorObject),

    /// The call's completion slot was dropped without a response, because
    /// the owning Session was disconnected.
    #[error("call cancelled: session disconnected before a response arrived")]
    Cancelled,

    /// The call's `call_timeout` elapsed with no response.
    #[error("call timed out waiting for a response")]
    Timeout,

    /// The request or its params could not be serialized.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result alias for outbound RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
