//! Transport-level failures.

use thiserror::Error;

/// Failures a [`crate::Transport`] implementation can report.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `connect` could not establish the underlying connection.
    #[error("connect failed: {0}")]
    Connect(String),

    /// `send` was attempted on a closed or never-connected transport.
    #[error("cannot send: transport is closed")]
    Closed,

    /// The underlying I/O layer reported a failure.
    #[error("transport I/O error: {0}")]
    Io(String),
}

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
