//! Errors raised while building or decoding wire payloads.

use thiserror::Error;

/// Failures that can occur while decoding a wire payload.
#[derive(Debug, Error)]
pub enum WireError {
    /// A nested record (disk usage, memory, io counters) was neither a JSON
    /// object nor a decodable legacy `Key(a=1, b=2)` string.
    #[error("malformed nested record in field `{field}`: {detail}")]
    MalformedRecord { field: &'static str, detail: String },

    /// A legacy key=value record was missing a field the schema requires.
    #[error("legacy record for `{field}` is missing key `{key}`")]
    MissingLegacyKey { field: &'static str, key: &'static str },
}

/// Result alias for wire-level decoding.
pub type WireResult<T> = Result<T, WireError>;
