//! The value codec: host types to [`Value`] to runtime [`Object`] and back.
//!
//! Host types go through serde (`encode` / `decode`). Values cross into the
//! runtime through `to_object` / `from_object`. Every direction bounds
//! container nesting by `max_depth`, which also stops a walk through a
//! cyclic runtime list.

use std::collections::BTreeMap;

use embedlink_runtime::Object;
use embedlink_value::{check_depth, from_value, to_value, CodecError, Value, DEFAULT_MAX_DEPTH};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts values across the boundary with a fixed nesting limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    max_depth: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Codec {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Encode a host value.
    pub fn encode<T: Serialize + ?Sized>(&self, data: &T) -> Result<Value, CodecError> {
        to_value(data, self.max_depth)
    }

    /// Decode a value into a host type.
    pub fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, CodecError> {
        check_value_depth(&value, 0, self.max_depth)?;
        from_value(value)
    }

    /// Build the runtime object for a value.
    pub fn to_object(&self, value: &Value) -> Result<Object, CodecError> {
        self.to_object_at(value, 0)
    }

    fn to_object_at(&self, value: &Value, depth: usize) -> Result<Object, CodecError> {
        Ok(match value {
            Value::Null => Object::None,
            Value::Bool(b) => Object::Bool(*b),
            Value::Int(i) => Object::Int(*i),
            Value::Float(f) => Object::Float(*f),
            Value::String(s) => Object::str(s),
            Value::Bytes(b) => Object::bytes(b),
            Value::List(items) => {
                check_depth(depth, self.max_depth)?;
                let items = items
                    .iter()
                    .map(|item| self.to_object_at(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Object::list(items)
            }
            Value::Map(map) => {
                check_depth(depth, self.max_depth)?;
                let entries = map
                    .iter()
                    .map(|(k, v)| Ok((Object::str(k), self.to_object_at(v, depth + 1)?)))
                    .collect::<Result<Vec<_>, CodecError>>()?;
                Object::dict(entries)
            }
        })
    }

    /// Read a runtime object back into a value.
    ///
    /// Dict keys must be strings; opaque runtime handles have no value form.
    pub fn from_object(&self, object: &Object) -> Result<Value, CodecError> {
        self.from_object_at(object, 0)
    }

    fn from_object_at(&self, object: &Object, depth: usize) -> Result<Value, CodecError> {
        Ok(match object {
            Object::None => Value::Null,
            Object::Bool(b) => Value::Bool(*b),
            Object::Int(i) => Value::Int(*i),
            Object::Float(f) => Value::Float(*f),
            Object::Str(s) => Value::String(s.to_string()),
            Object::Bytes(b) => Value::Bytes(b.to_vec()),
            Object::List(items) => {
                check_depth(depth, self.max_depth)?;
                let items = items.read_recursive();
                let values = items
                    .iter()
                    .map(|item| self.from_object_at(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::List(values)
            }
            Object::Dict(entries) => {
                check_depth(depth, self.max_depth)?;
                let entries = entries.read_recursive();
                let mut map = BTreeMap::new();
                for (key, value) in entries.iter() {
                    let key = key.as_str().ok_or_else(|| {
                        CodecError::unrepresentable(
                            format!("dict key of type '{}'", key.type_name()),
                            "map keys must be strings",
                        )
                    })?;
                    map.insert(key.to_string(), self.from_object_at(value, depth + 1)?);
                }
                Value::Map(map)
            }
            Object::Opaque(name) => {
                return Err(CodecError::unrepresentable(
                    format!("'{}' object", name),
                    "it has no host representation",
                ))
            }
        })
    }
}

fn check_value_depth(value: &Value, depth: usize, max_depth: usize) -> Result<(), CodecError> {
    match value {
        Value::List(items) => {
            check_depth(depth, max_depth)?;
            items
                .iter()
                .try_for_each(|item| check_value_depth(item, depth + 1, max_depth))
        }
        Value::Map(map) => {
            check_depth(depth, max_depth)?;
            map.values()
                .try_for_each(|item| check_value_depth(item, depth + 1, max_depth))
        }
        _ => Ok(()),
    }
}
