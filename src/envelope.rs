//! Response envelope decoding and status classification.
//!
//! Every endpoint answers with a JSON object of the form
//! `{"code": <number>, "data": <object|array>?, ...}`. The HTTP status is not
//! meaningful on its own; `code == 200` is the only success signal. This
//! module parses that envelope, models `data` as [`DataPayload`] so the
//! executor can match on its shape, and maps `code` to a result.

use serde_json::{Map, Value};

use crate::error::{FortiSaseError, Result};

/// Shape of the envelope's `data` field.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    /// No `data` key. The payload, if any, sits at the top level.
    Absent,
    /// A single resource.
    Object(Map<String, Value>),
    /// A collection.
    List(Vec<Value>),
    /// Anything else (string, number, bool, null).
    Other(Value),
}

impl DataPayload {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None => DataPayload::Absent,
            Some(Value::Object(map)) => DataPayload::Object(map.clone()),
            Some(Value::Array(items)) => DataPayload::List(items.clone()),
            Some(other) => DataPayload::Other(other.clone()),
        }
    }
}

/// A decoded response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The numeric `code`, if present and numeric.
    pub code: Option<i64>,
    /// The `data` field, by shape.
    pub data: DataPayload,
    /// The whole envelope object.
    pub raw: Map<String, Value>,
}

impl Envelope {
    /// Parses a response body. Returns `None` if it is not a JSON object.
    pub fn parse(body: &str) -> Option<Envelope> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(raw)) => {
                let code = raw.get("code").and_then(numeric_code);
                let data = DataPayload::from_value(raw.get("data"));
                Some(Envelope { code, data, raw })
            }
            _ => None,
        }
    }

    /// The whole envelope as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.raw)
    }
}

/// Reads `code` as an integer. Integral floats (`200.0`) count; fractional
/// or out-of-range numbers do not.
fn numeric_code(value: &Value) -> Option<i64> {
    if let Some(code) = value.as_i64() {
        return Some(code);
    }
    let float = value.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.is_finite() && float.fract() == 0.0 && in_range).then_some(float as i64)
}

/// Maps an envelope to its classifier code or error.
///
/// - `None` envelope or no numeric `code`: [`FortiSaseError::Opaque`] with
///   the raw body (classifier code -100).
/// - `code == 200`: `Ok(200)`.
/// - Any other code: [`FortiSaseError::Api`] with the code and its category.
pub fn classify(envelope: Option<&Envelope>, raw_body: &str) -> Result<i64> {
    match envelope.and_then(|e| e.code) {
        Some(200) => Ok(200),
        Some(code) => Err(FortiSaseError::api(code)),
        None => Err(FortiSaseError::Opaque {
            body: raw_body.to_string(),
        }),
    }
}

/// JSON type name used in decode errors.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
