//! Proptest generators for property-based testing.

use proptest::prelude::*;

use weardata_core::{DataMap, DataUri, DataValue, FilterMode, StructuredValue};

/// Generate a DataMap key.
pub fn key() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,11}".prop_map(String::from)
}

/// Generate a short string value.
pub fn text() -> impl Strategy<Value = String> {
    ".{0,16}".prop_map(String::from)
}

/// Generate a finite double.
pub fn finite_double() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL
}

/// Generate a data item path such as `/a/b`.
pub fn item_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9]{1,8}", 1..=4).prop_map(|segments| {
        segments
            .iter()
            .map(|s| format!("/{s}"))
            .collect::<String>()
    })
}

/// Generate a uri on node `n` or without a node.
pub fn data_uri() -> impl Strategy<Value = DataUri> {
    (any::<bool>(), item_path()).prop_map(|(with_node, path)| {
        let text = if with_node {
            format!("wear://n{path}")
        } else {
            path
        };
        DataUri::parse(&text).expect("generated uri is valid")
    })
}

/// Generate one of the two known filter modes.
pub fn filter_mode() -> impl Strategy<Value = FilterMode> {
    prop_oneof![Just(FilterMode::LITERAL), Just(FilterMode::PREFIX)]
}

/// Generate a scalar or typed-array DataValue the codec carries both ways.
pub fn leaf_value() -> impl Strategy<Value = DataValue> {
    prop_oneof![
        any::<i32>().prop_map(DataValue::Integer),
        any::<i64>().prop_map(DataValue::Long),
        finite_double().prop_map(DataValue::Double),
        any::<bool>().prop_map(DataValue::Boolean),
        text().prop_map(DataValue::String),
        prop::collection::vec(any::<i64>(), 0..6).prop_map(DataValue::LongArray),
        prop::collection::vec(text(), 0..6).prop_map(DataValue::StringArray),
        prop::collection::vec(any::<i32>().prop_map(DataValue::Integer), 0..6)
            .prop_map(DataValue::List),
        prop::collection::vec(text().prop_map(DataValue::String), 1..6)
            .prop_map(DataValue::List),
    ]
}

/// Generate a DataMap built only from codec-supported kinds, nested up to
/// `depth` levels (including lists of maps).
pub fn data_map(depth: u32) -> BoxedStrategy<DataMap> {
    let flat = prop::collection::btree_map(key(), leaf_value(), 0..6)
        .prop_map(|entries| entries.into_iter().collect::<DataMap>());
    if depth == 0 {
        return flat.boxed();
    }

    let nested = prop_oneof![
        4 => leaf_value(),
        1 => data_map(depth - 1).prop_map(DataValue::DataMap),
        1 => prop::collection::vec(data_map(depth - 1).prop_map(DataValue::DataMap), 1..3)
            .prop_map(DataValue::List),
    ];
    prop::collection::btree_map(key(), nested, 0..6)
        .prop_map(|entries| entries.into_iter().collect::<DataMap>())
        .boxed()
}

/// Generate a structured value that is not an object.
pub fn non_object_value() -> impl Strategy<Value = StructuredValue> {
    prop_oneof![
        Just(StructuredValue::Null),
        any::<bool>().prop_map(StructuredValue::Boolean),
        any::<i32>().prop_map(StructuredValue::Integer),
        any::<i64>().prop_map(StructuredValue::Long),
        finite_double().prop_map(StructuredValue::Double),
        text().prop_map(StructuredValue::String),
        prop::collection::vec(any::<i32>(), 0..4).prop_map(StructuredValue::IntegerArray),
        prop::collection::vec(any::<i32>().prop_map(StructuredValue::Integer), 0..4)
            .prop_map(StructuredValue::Array),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use weardata_core::{decode, encode, CodecError, MatchMode};

    proptest! {
        #[test]
        fn test_decode_inverts_encode(map in data_map(2)) {
            let decoded = decode(&encode(&map)).unwrap();
            prop_assert_eq!(decoded, map);
        }

        #[test]
        fn test_non_objects_are_rejected(value in non_object_value()) {
            let is_not_object = matches!(decode(&value), Err(CodecError::NotAnObject { .. }));
            prop_assert!(is_not_object);
        }

        #[test]
        fn test_integer_lists_reject_non_numeric_strings(
            head in any::<i32>(),
            word in "[a-z]{1,6}",
        ) {
            let value = StructuredValue::object([(
                "v",
                StructuredValue::Array(vec![
                    StructuredValue::Integer(head),
                    StructuredValue::String(word),
                ]),
            )]);
            prop_assert!(decode(&value).is_err());
        }

        #[test]
        fn test_uri_matches_itself(uri in data_uri(), mode in filter_mode()) {
            let mode = mode.match_mode().unwrap_or(MatchMode::Literal);
            prop_assert!(uri.matches(&uri, mode));
        }
    }
}
