//! Host types in and out of [`Value`].
//!
//! Host types are serialized straight into a [`Value`]; the way back goes
//! through the JSON data model. Every conversion that builds a `Value` takes
//! a depth limit so pathological inputs fail with [`CodecError::TooDeep`]
//! instead of growing the stack without bound.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ser::ValueSerializer;
use crate::{CodecError, Value};

/// Container nesting allowed when no limit is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Serialize any host value into a [`Value`], bounded by `max_depth`.
pub fn to_value<T: Serialize + ?Sized>(data: &T, max_depth: usize) -> Result<Value, CodecError> {
    data.serialize(ValueSerializer::new(max_depth))
}

/// Rebuild a host value from a [`Value`].
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
    let json = value_to_json(value);
    serde_json::from_value(json).map_err(|e| CodecError::Mismatch(e.to_string()))
}

/// Lower a [`Value`] into the JSON data model.
///
/// Bytes become base64 strings and non-finite floats become null, since
/// JSON has no spelling for either.
pub fn value_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Int(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Bytes(b) => {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&b);
            serde_json::Value::String(encoded)
        }
        Value::List(items) => {
            serde_json::Value::Array(items.into_iter().map(value_to_json).collect())
        }
        Value::Map(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

/// Lift JSON into a [`Value`], enforcing `max_depth`.
pub fn json_to_value(json: serde_json::Value, max_depth: usize) -> Result<Value, CodecError> {
    json_to_value_at(json, 0, max_depth)
}

fn json_to_value_at(
    json: serde_json::Value,
    depth: usize,
    max_depth: usize,
) -> Result<Value, CodecError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if n.is_u64() {
                Err(CodecError::unrepresentable(
                    format!("integer {}", n),
                    "exceeds the signed 64-bit range",
                ))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(CodecError::unrepresentable(
                    format!("number {}", n),
                    "not an i64 or f64",
                ))
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s)),
        serde_json::Value::Array(items) => {
            check_depth(depth, max_depth)?;
            items
                .into_iter()
                .map(|item| json_to_value_at(item, depth + 1, max_depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        serde_json::Value::Object(map) => {
            check_depth(depth, max_depth)?;
            map.into_iter()
                .map(|(k, v)| Ok((k, json_to_value_at(v, depth + 1, max_depth)?)))
                .collect::<Result<_, CodecError>>()
                .map(Value::Map)
        }
    }
}

/// Fails when opening another container at `depth` would exceed the limit.
pub fn check_depth(depth: usize, max_depth: usize) -> Result<(), CodecError> {
    if depth >= max_depth {
        Err(CodecError::TooDeep { limit: max_depth })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
        ratio: f64,
        tags: Vec<String>,
    }

    #[test]
    fn struct_survives_the_trip() {
        let sample = Sample {
            name: "probe".to_string(),
            count: 3,
            ratio: 0.5,
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let value = to_value(&sample, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(value.get("count"), Some(&Value::Int(3)));

        let recovered: Sample = from_value(value).unwrap();
        assert_eq!(sample, recovered);
    }

    #[test]
    fn options_map_to_null() {
        let some = to_value(&Some(42i32), DEFAULT_MAX_DEPTH).unwrap();
        let none = to_value(&None::<i32>, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(some, Value::Int(42));
        assert_eq!(none, Value::Null);

        assert_eq!(from_value::<Option<i32>>(some).unwrap(), Some(42));
        assert_eq!(from_value::<Option<i32>>(none).unwrap(), None);
    }

    #[test]
    fn large_unsigned_is_rejected() {
        let err = to_value(&u64::MAX, DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, CodecError::Unrepresentable { .. }));
        assert!(err.to_string().contains("18446744073709551615"));
    }

    #[test]
    fn nesting_beyond_limit_is_too_deep() {
        let nested = vec![vec![vec![1]]];
        assert!(to_value(&nested, 3).is_ok());
        assert_eq!(
            to_value(&nested, 2).unwrap_err(),
            CodecError::TooDeep { limit: 2 }
        );
    }

    #[test]
    fn from_value_mismatch() {
        let err = from_value::<Sample>(Value::from("not a struct")).unwrap_err();
        assert!(matches!(err, CodecError::Mismatch(_)));
    }

    #[test]
    fn value_to_json_bytes_are_base64() {
        let json = value_to_json(Value::Bytes(vec![1, 2, 3, 4]));
        assert_eq!(json, serde_json::json!("AQIDBA=="));
    }

    #[test]
    fn nan_lowers_to_null() {
        assert_eq!(value_to_json(Value::Float(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn integral_json_numbers_stay_ints() {
        let value = json_to_value(
            serde_json::json!({"integer": 42, "float": 2.75, "negative": -100}),
            DEFAULT_MAX_DEPTH,
        )
        .unwrap();
        assert_eq!(value.get("integer"), Some(&Value::Int(42)));
        assert_eq!(value.get("negative"), Some(&Value::Int(-100)));
        assert_eq!(value.get("float"), Some(&Value::Float(2.75)));
    }

    #[test]
    fn json_to_value_zero_depth_allows_scalars_only() {
        assert_eq!(
            json_to_value(serde_json::json!("flat"), 0).unwrap(),
            Value::from("flat")
        );
        assert!(json_to_value(serde_json::json!([]), 0).is_err());
    }
}
