//! Field readers that never fail on an off-type value.
//!
//! Each reader takes the field as a raw JSON value and keeps what it can;
//! a value of the wrong type degrades to absent instead of rejecting the
//! enclosing object. Use with `#[serde(default, deserialize_with = "...")]`.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

/// Strings as-is; numbers and booleans rendered as text; anything else absent.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// The number exactly as received (`60` stays an integer, `25.0` a float).
pub fn number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => Some(n),
        _ => None,
    })
}

/// An object, or an empty map for anything else.
pub fn map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(object(deserializer)?.unwrap_or_default())
}

/// An object, or absent for anything else.
pub fn object<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

/// Any value, keeping an explicit `null` as `Some(Value::Null)`.
///
/// Paired with `#[serde(default)]`, only a missing key reads as `None`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
