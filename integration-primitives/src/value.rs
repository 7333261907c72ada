//! Closed dynamic value model for free-form payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Ordered key/value payload carried by requests, events, metric tags, and
/// tool invocations.
pub type Payload = BTreeMap<String, DynamicValue>;

/// A dynamically-typed value restricted to the JSON data model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum DynamicValue {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value; integers keep their exact representation.
    Number(Number),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    List(Vec<DynamicValue>),
    /// Nested key/value map.
    Map(Payload),
}

impl DynamicValue {
    /// Returns `true` for [`DynamicValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the numeric content as `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => value.as_f64(),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is an integer representable as `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(value) => value.as_i64(),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is an integer representable as `u64`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(value) => value.as_u64(),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list content, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the map content, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&Payload> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this value is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Non-finite values have no JSON form and become [`DynamicValue::Null`].
impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for DynamicValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<Number> for DynamicValue {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(values: Vec<DynamicValue>) -> Self {
        Self::List(values)
    }
}

impl From<Payload> for DynamicValue {
    fn from(map: Payload) -> Self {
        Self::Map(map)
    }
}

impl<T> From<Option<T>> for DynamicValue
where
    T: Into<DynamicValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_json() {
        let json = r#"{"name": "search", "count": 3, "ok": true, "tags": ["a", null], "inner": {"x": 1.5}}"#;
        let payload: Payload = serde_json::from_str(json).unwrap();

        assert_eq!(payload["name"].as_str(), Some("search"));
        assert_eq!(payload["count"].as_f64(), Some(3.0));
        assert_eq!(payload["count"].as_i64(), Some(3));
        assert_eq!(payload["ok"].as_bool(), Some(true));
        assert_eq!(payload["tags"].as_list().map(<[_]>::len), Some(2));
        assert!(payload["tags"].as_list().unwrap()[1].is_null());
        assert_eq!(
            payload["inner"].get("x").and_then(DynamicValue::as_f64),
            Some(1.5)
        );
    }

    #[test]
    fn encodes_without_variant_tags() {
        let mut payload = Payload::new();
        payload.insert("query".into(), "rust".into());
        payload.insert("limit".into(), 10_i64.into());

        let encoded = serde_json::to_string(&payload).unwrap();
        assert_eq!(encoded, r#"{"limit":10,"query":"rust"}"#);
    }

    #[test]
    fn integers_survive_decode_and_encode() {
        let json = r#"{"big":9007199254740993,"neg":-3,"page":10,"ratio":0.25}"#;
        let payload: Payload = serde_json::from_str(json).unwrap();

        assert_eq!(payload["big"].as_u64(), Some(9_007_199_254_740_993));
        assert_eq!(payload["neg"].as_i64(), Some(-3));
        assert_eq!(payload["ratio"].as_i64(), None);
        assert_eq!(serde_json::to_string(&payload).unwrap(), json);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert!(DynamicValue::from(f64::NAN).is_null());
        assert!(DynamicValue::from(f64::INFINITY).is_null());
        assert_eq!(DynamicValue::from(1.5).as_f64(), Some(1.5));
    }
}
