//! Safe path access over untyped JSON trees.
//!
//! The raw ledger schemas nest `fields` records many levels deep; these
//! helpers replace scattered unchecked lookups with one chained walk that
//! returns `Option` (or an empty slice) and never panics.

use serde_json::Value;

const EMPTY: &[Value] = &[];

/// Follow a chain of object keys. `None` as soon as a step is missing.
pub fn at<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in keys {
        current = current.get(key)?;
    }
    Some(current)
}

/// String at the given key chain.
pub fn str_at<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    at(value, keys).and_then(Value::as_str)
}

/// Array at the given key chain, empty when absent or not an array.
pub fn array_at<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    at(value, keys)
        .and_then(Value::as_array)
        .map_or(EMPTY, Vec::as_slice)
}

/// Render a scalar as its bare string form: strings as-is, numbers and bools
/// in decimal/literal form, everything else `None`.
pub fn plain_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
