//! Session-level failures.

use thiserror::Error;

/// Failures a [`crate::Session`] can raise while establishing a connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying transport could not be established.
    #[error(transparent)]
    Transport(#[from] rsm_transport::TransportError),
}

/// Result alias for session-establishing operations.
pub type SessionResult<T> = Result<T, SessionError>;
