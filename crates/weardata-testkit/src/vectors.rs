//! Codec vectors: JSON payloads and what the codec makes of them.
//!
//! Each vector is decoded into a DataMap and encoded back. The result is
//! either the normalised JSON the caller would read back, or a decode error
//! naming the offending key path.

use serde_json::Value;
use weardata_core::{decode, encode, StructuredValue};

/// What a vector should produce.
#[derive(Debug, Clone, Copy)]
pub enum Expected {
    /// JSON text after decode then encode.
    Output(&'static str),
    /// Decode fails with a message containing this text.
    Error(&'static str),
}

/// A codec test vector.
#[derive(Debug, Clone)]
pub struct CodecVector {
    pub name: &'static str,
    /// Payload as the host sends it.
    pub input: &'static str,
    pub expected: Expected,
}

/// Get all codec vectors.
pub fn all_vectors() -> Vec<CodecVector> {
    vec![
        CodecVector {
            name: "scalars and string list",
            input: r#"{"count": 3, "tags": ["a", "b"]}"#,
            expected: Expected::Output(r#"{"count": 3, "tags": ["a", "b"]}"#),
        },
        CodecVector {
            name: "nested objects",
            input: r#"{"pos": {"x": 1.5, "y": -2}, "meta": {"inner": {"ok": true}}}"#,
            expected: Expected::Output(
                r#"{"pos": {"x": 1.5, "y": -2}, "meta": {"inner": {"ok": true}}}"#,
            ),
        },
        CodecVector {
            name: "long outside int range",
            input: r#"{"big": 5000000000, "small": -7}"#,
            expected: Expected::Output(r#"{"big": 5000000000, "small": -7}"#),
        },
        CodecVector {
            name: "integer list coerces numbers and numeric strings",
            input: r#"{"n": [1, 2.7, "3", -4.2]}"#,
            expected: Expected::Output(r#"{"n": [1, 2, 3, -4]}"#),
        },
        CodecVector {
            name: "string list stringifies scalars",
            input: r#"{"s": ["a", 1, true]}"#,
            expected: Expected::Output(r#"{"s": ["a", "1", "true"]}"#),
        },
        CodecVector {
            name: "list of objects",
            input: r#"{"points": [{"x": 1}, {"x": 2, "label": "b"}]}"#,
            expected: Expected::Output(r#"{"points": [{"x": 1}, {"x": 2, "label": "b"}]}"#),
        },
        CodecVector {
            name: "empty array keeps its key",
            input: r#"{"e": []}"#,
            expected: Expected::Output(r#"{"e": []}"#),
        },
        CodecVector {
            name: "null is dropped",
            input: r#"{"gone": null, "kept": "x"}"#,
            expected: Expected::Output(r#"{"kept": "x"}"#),
        },
        CodecVector {
            name: "empty object",
            input: r#"{}"#,
            expected: Expected::Output(r#"{}"#),
        },
        CodecVector {
            name: "integer list with a word",
            input: r#"{"v": [1, "x"]}"#,
            expected: Expected::Error("v[1]"),
        },
        CodecVector {
            name: "nested mismatch reports full path",
            input: r#"{"a": {"b": [{"c": 1}, 2]}}"#,
            expected: Expected::Error("a.b[1]"),
        },
        CodecVector {
            name: "boolean list drops only its key",
            input: r#"{"flags": [true, false], "n": 1}"#,
            expected: Expected::Output(r#"{"n": 1}"#),
        },
        CodecVector {
            name: "double list drops only its key",
            input: r#"{"bad": [0.5, 1.5], "nested": [[1]], "n": 1}"#,
            expected: Expected::Output(r#"{"n": 1}"#),
        },
        CodecVector {
            name: "top-level array",
            input: r#"[1, 2]"#,
            expected: Expected::Error("expected an object"),
        },
    ]
}

/// Run one vector; returns the rendered outcome on mismatch.
pub fn run_vector(vector: &CodecVector) -> Result<(), String> {
    let input: Value = serde_json::from_str(vector.input).map_err(|e| e.to_string())?;
    let decoded = decode(&StructuredValue::from(input));

    match (vector.expected, decoded) {
        (Expected::Output(text), Ok(map)) => {
            let expected: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
            let actual = encode(&map).to_json();
            if actual == expected {
                Ok(())
            } else {
                Err(actual.to_string())
            }
        }
        (Expected::Error(fragment), Err(e)) if e.to_string().contains(fragment) => Ok(()),
        (_, Err(e)) => Err(format!("error: {e}")),
        (Expected::Error(_), Ok(map)) => Err(encode(&map).to_json().to_string()),
    }
}

/// Run every vector: `(name, passed, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match run_vector(v) {
            Ok(()) => (v.name.to_string(), true, String::new()),
            Err(detail) => (v.name.to_string(), false, detail),
        })
        .collect()
}
