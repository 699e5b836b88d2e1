//! Helpers for pulling typed values out of a loose `serde_json::Value` object.
//!
//! The scalar helpers never fail: a missing or mistyped key yields the
//! default. [`param_typed`] is the strict variant for structured values,
//! where silently ignoring a malformed entry would hide a user mistake.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::EngineError;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
///
/// Accepts both JSON numbers (including integers) and converts them to f64.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a `u64` from `params[name]`, returning `default` if missing or
/// not a non-negative integer.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Deserializes `params[name]` into `T`.
///
/// Returns `Ok(None)` when the key is absent or null and
/// `EngineError::ParamTypeMismatch` when it is present but does not match.
pub fn param_typed<T: DeserializeOwned>(
    params: &Value,
    name: &str,
) -> Result<Option<T>, EngineError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| EngineError::ParamTypeMismatch {
                name: name.to_owned(),
                expected: std::any::type_name::<T>().to_owned(),
                got: format!("{} ({e})", json_type_name(value)),
            }),
    }
}

/// Short JSON type name of a value, used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
