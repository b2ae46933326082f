//! Property-based tests for the round-trip and determinism guarantees.

use num_bigint::BigInt;
use proptest::prelude::*;
use serde_ots::{
    from_json, from_slice, from_slice_with_options, to_bytes, to_json, DecodeOptions, Dict,
    Object, Registry, TypeName, Value,
};
use unicode_normalization::UnicodeNormalization;

fn nfc_text() -> impl Strategy<Value = String> {
    any::<String>().prop_map(|s| s.replace('\0', "").nfc().collect())
}

fn key() -> impl Strategy<Value = String> {
    nfc_text().prop_filter("keys must not be empty", |s| !s.is_empty())
}

fn type_name() -> impl Strategy<Value = TypeName> {
    "[a-z][a-z0-9_.-]{0,12}"
        .prop_filter("reserved names", |s| {
            !matches!(
                s.as_str(),
                "null" | "bool" | "int" | "uint" | "str" | "bytes" | "dict" | "list"
                    | "list_end" | "obj"
            )
        })
        .prop_map(|s| TypeName::new(s).unwrap())
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        nfc_text().prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::btree_map(key(), inner.clone(), 0..6)
                .prop_map(|map| Value::Dict(map.into())),
            (type_name(), prop::collection::btree_map(key(), inner, 0..4)).prop_map(
                |(name, fields)| Value::from(Object::unknown(name, Dict::from(fields)))
            ),
        ]
    })
}

fn binary_roundtrip(value: &Value) -> Value {
    from_slice(&Registry::default(), &to_bytes(value).unwrap()).unwrap()
}

proptest! {
    #[test]
    fn prop_int_roundtrip(n in any::<i128>()) {
        let value = Value::from(n);
        prop_assert_eq!(binary_roundtrip(&value), value);
    }

    #[test]
    fn prop_big_int_roundtrip(digits in prop::collection::vec(any::<u32>(), 1..8), negative in any::<bool>()) {
        let mut n = BigInt::from(0u8);
        for d in digits {
            n = (n << 32u32) + BigInt::from(d);
        }
        if negative {
            n = -n;
        }
        let value = Value::Int(n);
        prop_assert_eq!(binary_roundtrip(&value), value);
    }

    #[test]
    fn prop_binary_roundtrip(v in value()) {
        prop_assert_eq!(binary_roundtrip(&v), v);
    }

    #[test]
    fn prop_json_roundtrip(v in value()) {
        let tree = to_json(&v).unwrap();
        prop_assert_eq!(from_json(&Registry::default(), &tree).unwrap(), v);
    }

    #[test]
    fn prop_reencode_identical(v in value()) {
        let bytes = to_bytes(&v).unwrap();
        let strict = DecodeOptions::canonical();
        let decoded = from_slice_with_options(&Registry::default(), &bytes, &strict).unwrap();
        prop_assert_eq!(to_bytes(&decoded).unwrap(), bytes);
    }

    #[test]
    fn prop_json_and_binary_agree(v in value()) {
        let via_json = from_json(&Registry::default(), &to_json(&v).unwrap()).unwrap();
        prop_assert_eq!(to_bytes(&via_json).unwrap(), to_bytes(&v).unwrap());
    }

    #[test]
    fn prop_insertion_order_irrelevant(entries in prop::collection::btree_map(key(), leaf(), 0..10)) {
        let forward: Dict = entries.clone().into_iter().collect();
        let backward: Dict = entries.into_iter().rev().collect();
        prop_assert_eq!(
            to_bytes(&Value::Dict(forward)).unwrap(),
            to_bytes(&Value::Dict(backward)).unwrap()
        );
    }

    #[test]
    fn prop_decoder_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = from_slice(&Registry::default(), &bytes);
    }
}
