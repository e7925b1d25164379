use std::collections::BTreeMap;

use embedlink::{BridgeError, Codec, CodecError, Value};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

fn primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e12f64..1.0e12f64).prop_map(Value::Float),
        ".{0,16}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    primitive().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

proptest! {
    #[test]
    fn test_primitives_survive_the_boundary(value in primitive()) {
        let codec = Codec::default();
        let object = codec.to_object(&value).unwrap();
        prop_assert_eq!(codec.from_object(&object).unwrap(), value);
    }

    #[test]
    fn test_containers_survive_the_boundary(value in nested()) {
        let codec = Codec::default();
        let object = codec.to_object(&value).unwrap();
        prop_assert_eq!(codec.from_object(&object).unwrap(), value);
    }

    #[test]
    fn test_host_integers_roundtrip(n in any::<i64>()) {
        let codec = Codec::default();
        let value = codec.encode(&n).unwrap();
        prop_assert_eq!(codec.decode::<i64>(value).unwrap(), n);
    }

    #[test]
    fn test_host_strings_roundtrip(s in ".{0,32}") {
        let codec = Codec::default();
        let value = codec.encode(&s).unwrap();
        prop_assert_eq!(codec.decode::<String>(value).unwrap(), s);
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    values: Vec<f64>,
    tags: BTreeMap<String, bool>,
    note: Option<String>,
}

#[test]
fn test_structs_roundtrip() {
    let codec = Codec::default();
    let reading = Reading {
        sensor: "t1".into(),
        values: vec![0.5, 1.25],
        tags: BTreeMap::from([("calibrated".to_string(), true)]),
        note: None,
    };

    let value = codec.encode(&reading).unwrap();
    assert_eq!(value.get("note"), Some(&Value::Null));
    assert_eq!(codec.decode::<Reading>(value).unwrap(), reading);
}

#[test]
fn test_out_of_range_integer_is_rejected() {
    let err = Codec::default().encode(&u64::MAX).unwrap_err();
    assert!(err.to_string().contains("exceeds the signed 64-bit range"));
}

/// Serializes as `n` nested single-element lists without building them.
struct Nested(usize);

impl Serialize for Nested {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        if self.0 == 0 {
            return serializer.serialize_unit();
        }
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&Nested(self.0 - 1))?;
        seq.end()
    }
}

#[test]
fn test_encode_stops_at_depth_limit() {
    let codec = Codec::new(8);

    let value = codec.encode(&Nested(8)).unwrap();
    assert_eq!(value.depth(), 8);

    let err = codec.encode(&Nested(9)).unwrap_err();
    assert_eq!(err, CodecError::TooDeep { limit: 8 });

    // Far past any stack budget: must fail at the limit, not recurse.
    let err = codec.encode(&Nested(1_000_000)).unwrap_err();
    assert_eq!(err, CodecError::TooDeep { limit: 8 });
}

#[test]
fn test_encode_too_deep_maps_to_bridge_error() {
    let err = Codec::new(4)
        .encode(&Nested(5))
        .map_err(BridgeError::encoding)
        .unwrap_err();
    assert_eq!(err, BridgeError::EncodingTooDeep { limit: 4 });
}
