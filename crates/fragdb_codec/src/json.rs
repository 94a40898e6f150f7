//! JSON interop.
//!
//! The upstream producer hands records over as JSON; query results can be
//! rendered back to JSON. These conversions are lossy only for byte
//! strings, which JSON cannot represent natively and which come back as
//! integer arrays.

use crate::value::Value;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

impl Value {
    /// Convert a `serde_json::Value` into a document value.
    ///
    /// Integral JSON numbers within i64 become `Integer`; everything else
    /// numeric becomes `Float`.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert this value into a `serde_json::Value`.
    ///
    /// Non-finite floats become JSON null, byte strings become arrays of
    /// integers.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(n) => JsonValue::Number(Number::from(*n)),
            Value::Float(x) => Number::from_f64(*x).map_or(JsonValue::Null, JsonValue::Number),
            Value::Bytes(b) => JsonValue::Array(
                b.iter()
                    .map(|byte| JsonValue::Number(Number::from(*byte)))
                    .collect(),
            ),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(pairs) => {
                let mut obj = JsonMap::new();
                for (k, v) in pairs {
                    obj.insert(k.clone(), v.to_json());
                }
                JsonValue::Object(obj)
            }
        }
    }
}
