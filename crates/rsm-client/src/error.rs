//! Failures the client embedder can observe.
//!
//! Four outcomes reach the embedder per the protocol spec: a successful
//! connect with a valid `get_initial_data`, a connect timeout, an
//! unsupported collector version, or an unexpected disconnect (delivered as
//! a callback, not an error — see [`crate::Client::connect`]).

use thiserror::Error;

use rsm_wire::ErrorObject;

/// Failure modes surfaced by [`crate::Client::connect`] and subsequent calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Transport could not be established, or failed mid-handshake.
    #[error(transparent)]
    Session(#[from] rsm_session::SessionError),

    /// The local request/response plumbing failed (encode error, call
    /// cancelled by a concurrent disconnect, etc).
    #[error(transparent)]
    Rpc(#[from] rsm_rpc::RpcError),

    /// The collector answered a request with a JSON-RPC error object.
    #[error("collector returned an error: {0}")]
    Remote(ErrorObject),

    /// A response's `result` did not decode into the expected type.
    #[error("failed to decode `{method}` result: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The connect handshake (dial + version check + machine info + initial
    /// snapshot) did not complete within the 5-second deadline.
    #[error("connect timed out after 5 seconds")]
    Timeout,

    /// `get_api_info` reported an `id` other than the sentinel this client
    /// expects.
    #[error("unexpected collector id: expected `{expected}`, got `{actual}`")]
    UnexpectedId { expected: &'static str, actual: String },

    /// `get_api_info` reported a `version` below [`crate::MIN_API_VERSION`].
    #[error("unsupported collector version `{reported}`: this client requires >= `{minimum}`")]
    UnsupportedVersion { reported: String, minimum: &'static str },

    /// `get_api_info`'s `version` field was not valid semver.
    #[error("collector reported a malformed version string `{0}`")]
    MalformedVersion(String),
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
