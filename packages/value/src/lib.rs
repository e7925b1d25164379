//! embedlink values: the shared representation at the host/runtime boundary.
//!
//! This layer knows nothing about the embedded runtime. It provides:
//! - `Value`: the tagged union every boundary crossing is expressed in
//! - `to_value` / `from_value`: serde conversions for host types
//! - `value_to_json` / `json_to_value`: JSON interop for display and parsing
//! - `CodecError`: what goes wrong when a conversion cannot be represented
//!
//! # Example
//!
//! ```rust
//! use embedlink_value::{from_value, to_value, Value, DEFAULT_MAX_DEPTH};
//!
//! let value = to_value(&vec![1, 2, 3], DEFAULT_MAX_DEPTH).unwrap();
//! assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
//!
//! let back: Vec<i32> = from_value(value).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

mod convert;
mod error;
mod ser;
mod value;

pub use convert::{
    check_depth, from_value, json_to_value, to_value, value_to_json, DEFAULT_MAX_DEPTH,
};
pub use error::CodecError;
pub use value::Value;
