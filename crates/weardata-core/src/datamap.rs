//! DataMap: the restricted key-value payload accepted by the sync transport.
//!
//! A `DataMap` only holds the kinds the transport knows how to carry. The
//! codec produces the first group of `DataValue` variants; the second group
//! (`Byte` onward) can only arrive from the transport and has no structured
//! value counterpart.
//!
//! The binary form is CBOR, written with `ciborium`. Keys are kept in a
//! `BTreeMap`, so the same map always produces the same bytes.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A single value stored under a DataMap key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Integer(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    LongArray(Vec<i64>),
    StringArray(Vec<String>),
    DataMap(DataMap),
    /// Ordered sequence. Lists built through the typed setters hold a single
    /// element kind out of Integer, String, or DataMap.
    List(Vec<DataValue>),

    // Transport-only kinds.
    Byte(i8),
    Float(f32),
    ByteArray(Vec<u8>),
    FloatArray(Vec<f32>),
    /// Reference to a binary asset held by the transport.
    Asset(String),
}

impl DataValue {
    /// Short name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataValue::Integer(_) => "integer",
            DataValue::Long(_) => "long",
            DataValue::Double(_) => "double",
            DataValue::Boolean(_) => "boolean",
            DataValue::String(_) => "string",
            DataValue::LongArray(_) => "long array",
            DataValue::StringArray(_) => "string array",
            DataValue::DataMap(_) => "data map",
            DataValue::List(_) => "list",
            DataValue::Byte(_) => "byte",
            DataValue::Float(_) => "float",
            DataValue::ByteArray(_) => "byte array",
            DataValue::FloatArray(_) => "float array",
            DataValue::Asset(_) => "asset",
        }
    }
}

/// A string-keyed map of [`DataValue`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap {
    entries: BTreeMap<String, DataValue>,
}

impl DataMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.entries.get(key)
    }

    /// Insert a raw value, replacing any previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: DataValue) -> Option<DataValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<DataValue> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed setters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) {
        self.insert(key, DataValue::Integer(value));
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) {
        self.insert(key, DataValue::Long(value));
    }

    pub fn put_double(&mut self, key: impl Into<String>, value: f64) {
        self.insert(key, DataValue::Double(value));
    }

    pub fn put_boolean(&mut self, key: impl Into<String>, value: bool) {
        self.insert(key, DataValue::Boolean(value));
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, DataValue::String(value.into()));
    }

    pub fn put_long_array(&mut self, key: impl Into<String>, value: Vec<i64>) {
        self.insert(key, DataValue::LongArray(value));
    }

    pub fn put_string_array(&mut self, key: impl Into<String>, value: Vec<String>) {
        self.insert(key, DataValue::StringArray(value));
    }

    pub fn put_data_map(&mut self, key: impl Into<String>, value: DataMap) {
        self.insert(key, DataValue::DataMap(value));
    }

    pub fn put_integer_list(&mut self, key: impl Into<String>, value: Vec<i32>) {
        let items = value.into_iter().map(DataValue::Integer).collect();
        self.insert(key, DataValue::List(items));
    }

    pub fn put_string_list(&mut self, key: impl Into<String>, value: Vec<String>) {
        let items = value.into_iter().map(DataValue::String).collect();
        self.insert(key, DataValue::List(items));
    }

    pub fn put_data_map_list(&mut self, key: impl Into<String>, value: Vec<DataMap>) {
        let items = value.into_iter().map(DataValue::DataMap).collect();
        self.insert(key, DataValue::List(items));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed getters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(DataValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(DataValue::Long(l)) => Some(*l),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(DataValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_data_map(&self, key: &str) -> Option<&DataMap> {
        match self.get(key) {
            Some(DataValue::DataMap(map)) => Some(map),
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binary form
    // ─────────────────────────────────────────────────────────────────────────

    /// Encode to the transport's binary payload form.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    /// Read a map back from its binary payload form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

impl FromIterator<(String, DataValue)> for DataMap {
    fn from_iter<I: IntoIterator<Item = (String, DataValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
