//! JSON <-> Value conversion

use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::Result;
use crate::value::Value;

/// Convert JSON value to Value
pub fn from_json(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(arr) => Value::Array(arr.iter().map(from_json).collect()),
        JsonValue::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

/// Convert Value to JSON value
///
/// Follows `JSON.stringify` conventions: undefined object entries are
/// dropped, NaN and undefined elsewhere become null, dates become RFC 3339
/// strings with millisecond precision. Blobs become arrays of byte values
/// and maps become arrays of `[key, value]` pairs. Custom values have no
/// JSON form and become null.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null | Value::Undefined | Value::Custom(_) => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Date(d) => JsonValue::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Buffer(bytes) | Value::ArrayBuffer(bytes) => JsonValue::Array(
            bytes
                .iter()
                .map(|b| JsonValue::Number(Number::from(*b)))
                .collect(),
        ),
        Value::Array(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Object(obj) => {
            let mut map = Map::new();
            for (key, value) in obj {
                if !value.is_undefined() {
                    map.insert(key.clone(), to_json(value));
                }
            }
            JsonValue::Object(map)
        }
        Value::Map(entries) => JsonValue::Array(
            entries
                .iter()
                .map(|(k, v)| JsonValue::Array(vec![to_json(k), to_json(v)]))
                .collect(),
        ),
    }
}

fn number_to_json(n: f64) -> JsonValue {
    match Value::Number(n).as_i64() {
        Some(i) => JsonValue::Number(Number::from(i)),
        None => Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
    }
}

/// Parse JSON string to Value
pub fn parse_json(json_str: &str) -> Result<Value> {
    let json: JsonValue = serde_json::from_str(json_str)?;
    Ok(from_json(&json))
}

/// Stringify Value to JSON string
pub fn stringify_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&to_json(value))?)
}
