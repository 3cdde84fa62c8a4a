//! Adapts JSON-RPC `params` (array, object, or absent) to a tagged shape a
//! handler can pattern-match on, replacing the dynamic-language convention
//! of branching on `isinstance(params, list)` at dispatch time.

use serde_json::{Map, Value};

/// The shape of a call's parameters, resolved once at dispatch time.
#[derive(Debug, Clone)]
pub enum Params {
    /// `params` was a JSON array — positional arguments.
    Positional(Vec<Value>),
    /// `params` was a JSON object — named arguments.
    Named(Map<String, Value>),
    /// `params` was absent or `null` — a zero-argument call.
    None,
    /// `params` was present but neither array, object, nor null (a bare
    /// string/number/bool). No handler contract accepts this shape, so the
    /// engine treats it as an immediate Invalid-params case without ever
    /// calling the handler.
    Invalid(Value),
}

impl Params {
    /// Classify a raw `params` value.
    #[must_use]
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Params::None,
            Some(Value::Array(items)) => Params::Positional(items),
            Some(Value::Object(map)) => Params::Named(map),
            Some(other) => Params::Invalid(other),
        }
    }

    /// Look up an argument by its positional index (for `Positional`) or by
    /// name (for `Named`) — the classic JSON-RPC "subtract(minuend,
    /// subtrahend)" dual calling convention.
    #[must_use]
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        match self {
            Params::Positional(items) => items.get(index),
            Params::Named(map) => map.get(name),
            Params::None | Params::Invalid(_) => None,
        }
    }

    /// The positional argument at `index`, if `params` was an array.
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(items) => items.get(index),
            _ => None,
        }
    }

    /// The named argument `key`, if `params` was an object.
    #[must_use]
    pub fn named(&self, key: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_becomes_positional() {
        let params = Params::from_value(Some(json!([1, 2, 3])));
        assert_eq!(params.positional(1), Some(&json!(2)));
        assert_eq!(params.get(1, "ignored"), Some(&json!(2)));
    }

    #[test]
    fn object_becomes_named() {
        let params = Params::from_value(Some(json!({"minuend": 42, "subtrahend": 23})));
        assert_eq!(params.named("minuend"), Some(&json!(42)));
        assert_eq!(params.get(0, "minuend"), Some(&json!(42)));
    }

    #[test]
    fn absent_and_null_become_none() {
        assert!(matches!(Params::from_value(None), Params::None));
        assert!(matches!(Params::from_value(Some(Value::Null)), Params::None));
    }

    #[test]
    fn scalar_becomes_invalid() {
        assert!(matches!(Params::from_value(Some(json!("bar"))), Params::Invalid(_)));
        assert!(matches!(Params::from_value(Some(json!(42))), Params::Invalid(_)));
    }
}
