//! Conversion between [`StructuredValue`] trees and [`DataMap`] payloads.
//!
//! Decoding rejects list elements that cannot be coerced to the list's kind
//! with a [`CodecError`] naming the key path. Keys with no DataMap
//! counterpart (nulls, arrays of an unsupported kind) are dropped and
//! reported as [`ConversionLoss`] diagnostics. Encoding drops values the
//! structured form cannot express the same way.
//!
//! Array decoding looks at the first element only:
//!
//! | first element | result |
//! |---|---|
//! | (empty array) | empty integer list |
//! | integer | integer list, later elements coerced |
//! | string | string list, later scalars stringified |
//! | object | list of nested maps |
//! | anything else | key dropped |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datamap::{DataMap, DataValue};
use crate::error::CodecError;
use crate::record::{ChangeEvent, DataRecord};
use crate::value::StructuredValue;

/// Field names of encoded records and events.
pub mod fields {
    pub const URI: &str = "Uri";
    pub const DATA: &str = "Data";
    pub const TYPE: &str = "Type";
    pub const ERROR: &str = "error";
}

/// Why a value was left out of a conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// Map value of a kind the target form cannot hold.
    UnsupportedKind,
    /// List element other than integer, string, or map.
    UnsupportedListElement,
    /// Array whose first element picks no list kind; the whole key is dropped.
    UnsupportedArrayKind,
    /// Null has no data map counterpart.
    NullValue,
}

/// A value dropped during conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionLoss {
    pub path: String,
    pub kind: &'static str,
    pub reason: LossReason,
}

impl fmt::Display for ConversionLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            LossReason::UnsupportedKind => "unsupported value kind",
            LossReason::UnsupportedListElement => "unsupported list element",
            LossReason::UnsupportedArrayKind => "unsupported array element kind",
            LossReason::NullValue => "null value",
        };
        write!(f, "{} dropped at {}: {}", self.kind, self.path, reason)
    }
}

/// Codec behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Log dropped values at warn level instead of debug.
    pub warn_on_conversion_loss: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            warn_on_conversion_loss: true,
        }
    }
}

/// The structured value codec.
///
/// Stateless apart from its configuration; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a structured object into a data map, logging dropped nulls.
    pub fn decode(&self, value: &StructuredValue) -> Result<DataMap, CodecError> {
        let (map, losses) = decode_with_losses(value)?;
        self.report(&losses);
        Ok(map)
    }

    /// Encode a data map, logging every dropped value.
    pub fn encode(&self, map: &DataMap) -> StructuredValue {
        let (value, losses) = encode_with_losses(map);
        self.report(&losses);
        value
    }

    /// Encode a record as `{"Uri": .., "Data": ..}`.
    ///
    /// A payload that can't be read as a data map yields
    /// `{"error": "Invalid DataMapItem received: .."}` instead.
    pub fn encode_record(&self, record: &DataRecord) -> StructuredValue {
        let mut out = BTreeMap::new();
        match record.data_map() {
            Ok(map) => {
                out.insert(
                    fields::URI.to_string(),
                    StructuredValue::String(record.uri.to_string()),
                );
                out.insert(fields::DATA.to_string(), self.encode(&map));
            }
            Err(e) => {
                tracing::warn!(uri = %record.uri, "unreadable data item payload: {}", e);
                out.insert(
                    fields::ERROR.to_string(),
                    StructuredValue::String(format!("Invalid DataMapItem received: {e}")),
                );
            }
        }
        StructuredValue::Object(out)
    }

    /// Encode an event: the record shape plus `"Type"`.
    pub fn encode_event(&self, event: &ChangeEvent) -> StructuredValue {
        let mut value = self.encode_record(&event.record);
        if let StructuredValue::Object(map) = &mut value {
            map.insert(
                fields::TYPE.to_string(),
                StructuredValue::Integer(event.kind.code()),
            );
        }
        value
    }

    pub fn encode_records(&self, records: &[DataRecord]) -> StructuredValue {
        StructuredValue::Array(records.iter().map(|r| self.encode_record(r)).collect())
    }

    pub fn encode_events(&self, events: &[ChangeEvent]) -> StructuredValue {
        StructuredValue::Array(events.iter().map(|e| self.encode_event(e)).collect())
    }

    fn report(&self, losses: &[ConversionLoss]) {
        for loss in losses {
            if self.config.warn_on_conversion_loss {
                tracing::warn!(path = %loss.path, kind = loss.kind, "{}", loss);
            } else {
                tracing::debug!(path = %loss.path, kind = loss.kind, "{}", loss);
            }
        }
    }
}

/// Decode with the default codec.
pub fn decode(value: &StructuredValue) -> Result<DataMap, CodecError> {
    Codec::default().decode(value)
}

/// Encode with the default codec.
pub fn encode(map: &DataMap) -> StructuredValue {
    Codec::default().encode(map)
}

// ─────────────────────────────────────────────────────────────────────────────
// Decode
// ─────────────────────────────────────────────────────────────────────────────

/// Decode and return the dropped values alongside the map.
pub fn decode_with_losses(
    value: &StructuredValue,
) -> Result<(DataMap, Vec<ConversionLoss>), CodecError> {
    let StructuredValue::Object(entries) = value else {
        return Err(CodecError::NotAnObject {
            found: value.kind_name(),
        });
    };
    let mut losses = Vec::new();
    let map = decode_object(entries, "", &mut losses)?;
    Ok((map, losses))
}

fn decode_object(
    entries: &BTreeMap<String, StructuredValue>,
    path: &str,
    losses: &mut Vec<ConversionLoss>,
) -> Result<DataMap, CodecError> {
    let mut map = DataMap::new();
    for (key, value) in entries {
        let key_path = join_key(path, key);
        match value {
            StructuredValue::Null => losses.push(ConversionLoss {
                path: key_path,
                kind: value.kind_name(),
                reason: LossReason::NullValue,
            }),
            StructuredValue::Boolean(b) => map.put_boolean(key.as_str(), *b),
            StructuredValue::Integer(i) => map.put_int(key.as_str(), *i),
            StructuredValue::Long(l) => map.put_long(key.as_str(), *l),
            StructuredValue::Double(d) => map.put_double(key.as_str(), *d),
            StructuredValue::String(s) => map.put_string(key.as_str(), s.as_str()),
            StructuredValue::IntegerArray(items) => map.put_integer_list(key.as_str(), items.clone()),
            StructuredValue::StringArray(items) => map.put_string_array(key.as_str(), items.clone()),
            StructuredValue::LongArray(items) => map.put_long_array(key.as_str(), items.clone()),
            StructuredValue::Object(inner) => {
                let nested = decode_object(inner, &key_path, losses)?;
                map.put_data_map(key.as_str(), nested);
            }
            StructuredValue::Array(items) => {
                if let Some(list) = decode_array(items, &key_path, losses)? {
                    map.insert(key.as_str(), list);
                }
            }
        }
    }
    Ok(map)
}

fn decode_array(
    items: &[StructuredValue],
    path: &str,
    losses: &mut Vec<ConversionLoss>,
) -> Result<Option<DataValue>, CodecError> {
    let Some(first) = items.first() else {
        // No element to inspect; stored as an empty integer list.
        return Ok(Some(DataValue::List(Vec::new())));
    };

    let elements = match first {
        StructuredValue::Integer(_) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                coerce_int(item)
                    .map(DataValue::Integer)
                    .ok_or_else(|| mismatch(path, i, "integer", item))
            })
            .collect::<Result<Vec<_>, _>>()?,
        StructuredValue::String(_) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                coerce_string(item)
                    .map(DataValue::String)
                    .ok_or_else(|| mismatch(path, i, "string", item))
            })
            .collect::<Result<Vec<_>, _>>()?,
        StructuredValue::Object(_) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                StructuredValue::Object(inner) => {
                    decode_object(inner, &join_index(path, i), losses).map(DataValue::DataMap)
                }
                other => Err(mismatch(path, i, "object", other)),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            losses.push(ConversionLoss {
                path: path.to_string(),
                kind: other.kind_name(),
                reason: LossReason::UnsupportedArrayKind,
            });
            return Ok(None);
        }
    };
    Ok(Some(DataValue::List(elements)))
}

fn coerce_int(value: &StructuredValue) -> Option<i32> {
    match value {
        StructuredValue::Integer(i) => Some(*i),
        StructuredValue::Long(l) => i32::try_from(*l).ok(),
        StructuredValue::Double(d) => double_to_int(*d),
        StructuredValue::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(double_to_int))
        }
        _ => None,
    }
}

fn double_to_int(d: f64) -> Option<i32> {
    let t = d.trunc();
    if t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
        Some(t as i32)
    } else {
        None
    }
}

fn coerce_string(value: &StructuredValue) -> Option<String> {
    match value {
        StructuredValue::String(s) => Some(s.clone()),
        StructuredValue::Integer(i) => Some(i.to_string()),
        StructuredValue::Long(l) => Some(l.to_string()),
        StructuredValue::Double(d) => Some(d.to_string()),
        StructuredValue::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn mismatch(path: &str, index: usize, expected: &'static str, found: &StructuredValue) -> CodecError {
    CodecError::ElementMismatch {
        path: join_index(path, index),
        expected,
        found: found.kind_name().to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encode
// ─────────────────────────────────────────────────────────────────────────────

/// Encode and return the dropped values alongside the result.
pub fn encode_with_losses(map: &DataMap) -> (StructuredValue, Vec<ConversionLoss>) {
    let mut losses = Vec::new();
    let value = encode_map(map, "", &mut losses);
    (value, losses)
}

fn encode_map(map: &DataMap, path: &str, losses: &mut Vec<ConversionLoss>) -> StructuredValue {
    let mut out = BTreeMap::new();
    for (key, value) in map.iter() {
        let key_path = join_key(path, key);
        let encoded = match value {
            DataValue::Integer(i) => StructuredValue::Integer(*i),
            DataValue::Long(l) => StructuredValue::Long(*l),
            DataValue::Boolean(b) => StructuredValue::Boolean(*b),
            DataValue::Double(d) => StructuredValue::Double(*d),
            DataValue::String(s) => StructuredValue::String(s.clone()),
            DataValue::LongArray(items) => StructuredValue::LongArray(items.clone()),
            DataValue::StringArray(items) => StructuredValue::StringArray(items.clone()),
            DataValue::DataMap(inner) => encode_map(inner, &key_path, losses),
            DataValue::List(items) => encode_list(items, &key_path, losses),
            other => {
                losses.push(ConversionLoss {
                    path: key_path,
                    kind: other.kind_name(),
                    reason: LossReason::UnsupportedKind,
                });
                continue;
            }
        };
        out.insert(key.to_string(), encoded);
    }
    StructuredValue::Object(out)
}

fn encode_list(items: &[DataValue], path: &str, losses: &mut Vec<ConversionLoss>) -> StructuredValue {
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            DataValue::Integer(v) => out.push(StructuredValue::Integer(*v)),
            DataValue::String(s) => out.push(StructuredValue::String(s.clone())),
            DataValue::DataMap(inner) => out.push(encode_map(inner, &join_index(path, i), losses)),
            other => losses.push(ConversionLoss {
                path: join_index(path, i),
                kind: other.kind_name(),
                reason: LossReason::UnsupportedListElement,
            }),
        }
    }
    StructuredValue::Array(out)
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}
