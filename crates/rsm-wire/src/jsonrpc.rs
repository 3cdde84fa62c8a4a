//! JSON-RPC 2.0 envelope types.
//!
//! These types model the wire union described in the protocol spec: requests,
//! notifications, and responses (success or error), all pinned to the
//! `"jsonrpc": "2.0"` discriminator. Batch (array-shaped) requests are not
//! represented here at all — the engine rejects them before they ever reach
//! this layer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The only JSON-RPC version this system speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// Zero-sized marker that serializes as the literal `"2.0"` and rejects
/// anything else on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "unsupported jsonrpc version: expected \"{JSONRPC_VERSION}\", got \"{version}\""
            )))
        }
    }
}

/// A JSON-RPC request/response identifier.
///
/// `0` and `""` are valid ids distinct from "no id" — that distinction is
/// carried by [`ResponseId`], not folded into this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier (including the empty string).
    String(String),
    /// Numeric identifier (including zero).
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for RequestId {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

/// A response id that may be `null` — reserved for responses the engine
/// emits when the inbound id could not be determined (parse errors and
/// malformed requests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub Option<RequestId>);

impl ResponseId {
    /// Wrap a known request id.
    #[must_use]
    pub fn from_request(id: RequestId) -> Self {
        Self(Some(id))
    }

    /// The `null` id used for undeliverable-response cases.
    #[must_use]
    pub fn null() -> Self {
        Self(None)
    }

    /// `true` if this is the `null` id.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorObject {
    /// Numeric error code (see the canonical table in the protocol spec).
    pub code: i32,
    /// Short human-readable message.
    pub message: String,
    /// Optional structured error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Build an error object with no `data`.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to an error object.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// `-32700 Parse error`.
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// `-32600 Invalid Request`.
    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(-32600, "Invalid Request")
    }

    /// `-32601 Method not found`.
    #[must_use]
    pub fn method_not_found() -> Self {
        Self::new(-32601, "Method not found")
    }

    /// `-32602 Invalid params`.
    #[must_use]
    pub fn invalid_params() -> Self {
        Self::new(-32602, "Invalid params")
    }

    /// `-32603 Internal error`.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::new(-32603, "Internal error")
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}

/// A JSON-RPC request (expects a [`Response`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: RequestId,
}

impl RequestMessage {
    /// Build a request envelope.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC notification (fire-and-forget, no `id`, no response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub jsonrpc: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl NotificationMessage {
    /// Build a notification, encoding `params` from any `Serialize` value.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC response (success or error), correlated by `id`.
///
/// `result` and `error` are both plain `Option` fields, not an `untagged`
/// either/or payload: a conforming peer sets exactly one, but a malformed
/// peer message may set both, and the engine's tolerant pass-through policy
/// for inbound responses requires delivering such a message "as-is; do not
/// infer which is authoritative" rather than silently preferring one field
/// over the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: JsonRpcVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    pub id: ResponseId,
}

impl Response {
    /// Build a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            result: Some(result),
            error: None,
            id: ResponseId::from_request(id),
        }
    }

    /// Build an error response addressed to a known request id.
    #[must_use]
    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            result: None,
            error: Some(error),
            id: ResponseId::from_request(id),
        }
    }

    /// Build an error response with a `null` id (parse errors and the like).
    #[must_use]
    pub fn error_with_null_id(error: ErrorObject) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            result: None,
            error: Some(error),
            id: ResponseId::null(),
        }
    }

    /// `true` if this response carries a `result`. A malformed peer message
    /// carrying both `result` and `error` is `true` here without that
    /// implying `error` should be disregarded — callers that care about the
    /// tie-break case should inspect both [`Response::result`] and
    /// [`Response::error_object`] directly.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// The `result` value, if present.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// The error object, if present.
    #[must_use]
    pub fn error_object(&self) -> Option<&ErrorObject> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_zero_and_empty_string_are_not_null() {
        let zero: RequestId = 0i64.into();
        let empty: RequestId = "".into();
        assert!(!ResponseId::from_request(zero).is_null());
        assert!(!ResponseId::from_request(empty).is_null());
    }

    #[test]
    fn error_response_round_trips_with_null_id() {
        let resp = Response::error_with_null_id(ErrorObject::parse_error());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], Value::Null);
        assert_eq!(json["error"]["code"], -32700);
        assert!(json.get("result").is_none());
    }

    #[test]
    fn success_response_serializes_result_not_error() {
        let resp = Response::success(RequestId::Number(1), serde_json::json!(19));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["result"], 19);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn request_round_trips() {
        let req = RequestMessage {
            jsonrpc: JsonRpcVersion,
            method: "subtract".into(),
            params: Some(serde_json::json!([42, 23])),
            id: RequestId::Number(1),
        };
        let text = serde_json::to_string(&req).unwrap();
        let back: RequestMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(back.method, "subtract");
        assert_eq!(back.id, RequestId::Number(1));
    }

    #[test]
    fn rejects_wrong_jsonrpc_version() {
        let raw = serde_json::json!({"jsonrpc": "1.0", "method": "x", "id": 1});
        let result: Result<RequestMessage, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }

    #[test]
    fn a_response_carrying_both_result_and_error_keeps_both() {
        let raw = serde_json::json!({
            "jsonrpc": "2.0",
            "result": 19,
            "error": {"code": -32603, "message": "Internal error"},
            "id": 1,
        });
        let resp: Response = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.result(), Some(&Value::from(19)));
        assert_eq!(resp.error_object().map(|e| e.code), Some(-32603));
    }
}
