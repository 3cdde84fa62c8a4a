//! Tolerant decoder for the collector's legacy stringified nested records.
//!
//! Older collector builds (and any peer still speaking wire version
//! `"0.0.2"`) serialize nested records as strings that look like
//! `"DiskUsage(total=123, used=45, free=78, percent=36.6)"` instead of JSON
//! objects. A clean implementation emits proper nested JSON; this module is
//! the backward-compat read path for the string form.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{WireError, WireResult};

fn kv_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)\s*=\s*'?([^,')]+)?").unwrap())
}

/// Parse a `Name(key=value, key='value', ...)` string into its key/value
/// pairs. Unknown keys are kept (and ignored by callers); missing keys are
/// simply absent from the map.
pub fn parse_legacy_record(s: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for cap in kv_pattern().captures_iter(s) {
        let key = cap.get(1).map(|m| m.as_str().to_string());
        let value = cap.get(2).map(|m| m.as_str().trim().to_string());
        if let (Some(key), Some(value)) = (key, value) {
            out.insert(key, value);
        }
    }
    out
}

/// Fetch and parse a required numeric field out of a legacy key/value map.
pub fn legacy_u64(
    kv: &HashMap<String, String>,
    field: &'static str,
    key: &'static str,
) -> WireResult<u64> {
    let raw = kv
        .get(key)
        .ok_or(WireError::MissingLegacyKey { field, key })?;
    raw.parse::<u64>()
        .map_err(|e| WireError::MalformedRecord {
            field,
            detail: format!("key `{key}` is not an integer: {e}"),
        })
}

/// Fetch and parse a required float field out of a legacy key/value map.
pub fn legacy_f64(
    kv: &HashMap<String, String>,
    field: &'static str,
    key: &'static str,
) -> WireResult<f64> {
    let raw = kv
        .get(key)
        .ok_or(WireError::MissingLegacyKey { field, key })?;
    raw.parse::<f64>()
        .map_err(|e| WireError::MalformedRecord {
            field,
            detail: format!("key `{key}` is not a float: {e}"),
        })
}
