//! The structured value tree exchanged at the command boundary.
//!
//! `StructuredValue` is JSON with a finer number model: integers that fit in
//! 32 bits, integers that need 64 bits, and doubles are distinct variants, and
//! the transport's typed arrays have their own variants. Conversion from and to
//! `serde_json::Value` is lossless for everything JSON can express; the typed
//! arrays serialize as plain JSON arrays.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A recursive JSON-equivalent value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum StructuredValue {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    IntegerArray(Vec<i32>),
    StringArray(Vec<String>),
    LongArray(Vec<i64>),
    Object(BTreeMap<String, StructuredValue>),
    Array(Vec<StructuredValue>),
}

impl StructuredValue {
    /// Build an object from `(key, value)` pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, StructuredValue)>,
    {
        StructuredValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the variant, used in error messages and diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StructuredValue::Null => "null",
            StructuredValue::Boolean(_) => "boolean",
            StructuredValue::Integer(_) => "integer",
            StructuredValue::Long(_) => "long",
            StructuredValue::Double(_) => "double",
            StructuredValue::String(_) => "string",
            StructuredValue::IntegerArray(_) => "integer array",
            StructuredValue::StringArray(_) => "string array",
            StructuredValue::LongArray(_) => "long array",
            StructuredValue::Object(_) => "object",
            StructuredValue::Array(_) => "array",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, StructuredValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, StructuredValue>> {
        match self {
            StructuredValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StructuredValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this value is an object.
    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for StructuredValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => StructuredValue::Null,
            Value::Bool(b) => StructuredValue::Boolean(b),
            Value::Number(n) => number_to_structured(&n),
            Value::String(s) => StructuredValue::String(s),
            Value::Array(items) => {
                StructuredValue::Array(items.into_iter().map(StructuredValue::from).collect())
            }
            Value::Object(map) => StructuredValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, StructuredValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<StructuredValue> for Value {
    fn from(value: StructuredValue) -> Self {
        match value {
            StructuredValue::Null => Value::Null,
            StructuredValue::Boolean(b) => Value::Bool(b),
            StructuredValue::Integer(i) => Value::from(i),
            StructuredValue::Long(l) => Value::from(l),
            // Non-finite doubles have no JSON form.
            StructuredValue::Double(d) => Number::from_f64(d).map_or(Value::Null, Value::Number),
            StructuredValue::String(s) => Value::String(s),
            StructuredValue::IntegerArray(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            StructuredValue::StringArray(items) => {
                Value::Array(items.into_iter().map(Value::String).collect())
            }
            StructuredValue::LongArray(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            StructuredValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<Map<String, Value>>(),
            ),
            StructuredValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
        }
    }
}

fn number_to_structured(n: &Number) -> StructuredValue {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => StructuredValue::Integer(small),
            Err(_) => StructuredValue::Long(i),
        }
    } else if let Some(f) = n.as_f64() {
        // u64 above i64::MAX lands here as well.
        StructuredValue::Double(f)
    } else {
        StructuredValue::Null
    }
}

impl From<bool> for StructuredValue {
    fn from(b: bool) -> Self {
        StructuredValue::Boolean(b)
    }
}

impl From<i32> for StructuredValue {
    fn from(i: i32) -> Self {
        StructuredValue::Integer(i)
    }
}

impl From<i64> for StructuredValue {
    fn from(l: i64) -> Self {
        StructuredValue::Long(l)
    }
}

impl From<f64> for StructuredValue {
    fn from(d: f64) -> Self {
        StructuredValue::Double(d)
    }
}

impl From<&str> for StructuredValue {
    fn from(s: &str) -> Self {
        StructuredValue::String(s.to_string())
    }
}

impl From<String> for StructuredValue {
    fn from(s: String) -> Self {
        StructuredValue::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_pick_narrowest_variant() {
        assert_eq!(StructuredValue::from(json!(3)), StructuredValue::Integer(3));
        assert_eq!(
            StructuredValue::from(json!(5_000_000_000i64)),
            StructuredValue::Long(5_000_000_000)
        );
        assert_eq!(StructuredValue::from(json!(1.5)), StructuredValue::Double(1.5));
        assert_eq!(
            StructuredValue::from(json!(-2147483648i64)),
            StructuredValue::Integer(i32::MIN)
        );
    }

    #[test]
    fn test_typed_arrays_serialize_as_json_arrays() {
        let value = StructuredValue::object([
            ("ids", StructuredValue::LongArray(vec![1, 2])),
            ("names", StructuredValue::StringArray(vec!["a".into()])),
        ]);
        assert_eq!(value.to_json(), json!({"ids": [1, 2], "names": ["a"]}));
    }

    #[test]
    fn test_serde_goes_through_json() {
        let value: StructuredValue =
            serde_json::from_str(r#"{"count": 3, "tags": ["a", "b"], "on": true}"#).unwrap();
        assert_eq!(value.get("count"), Some(&StructuredValue::Integer(3)));
        assert_eq!(value.get("on"), Some(&StructuredValue::Boolean(true)));

        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"count":3,"on":true,"tags":["a","b"]}"#);
    }

    #[test]
    fn test_non_finite_double_becomes_null() {
        assert_eq!(StructuredValue::Double(f64::NAN).to_json(), Value::Null);
    }
}
