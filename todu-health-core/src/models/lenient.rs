//! Field decoders for stored records.
//!
//! Collections are plain JSON written by whatever client last touched them,
//! so numbers may arrive as strings and text fields may be null. Each
//! decoder accepts anything and falls back to the field's empty value.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn to_f64(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

fn to_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(to_f64(Value::deserialize(deserializer)?).unwrap_or(0.0))
}

/// Whole minutes; fractions round and negatives clamp to zero.
pub(crate) fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(to_f64(Value::deserialize(deserializer)?)
        .map(|n| n.round() as u32)
        .unwrap_or(0))
}

/// Epoch milliseconds.
pub(crate) fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(to_f64(Value::deserialize(deserializer)?)
        .map(|n| n as i64)
        .unwrap_or(0))
}

pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(to_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub(crate) fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(to_text(Value::deserialize(deserializer)?))
}
