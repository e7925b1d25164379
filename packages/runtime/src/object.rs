//! The interpreter's own object model.
//!
//! Objects are what native and WASM functions see. Lists and dicts are
//! shared and mutable, so an object graph may contain cycles; anything
//! walking one has to bound its own recursion.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared, mutable list storage.
pub type ListRef = Arc<RwLock<Vec<Object>>>;

/// Shared, mutable dict storage. Keys may be any object.
pub type DictRef = Arc<RwLock<Vec<(Object, Object)>>>;

/// A value living inside the embedded runtime.
#[derive(Clone)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Bytes(Arc<[u8]>),
    List(ListRef),
    Dict(DictRef),
    /// Runtime-internal handle with no host-side counterpart.
    Opaque(Arc<str>),
}

impl Object {
    pub fn str(s: impl AsRef<str>) -> Self {
        Object::Str(Arc::from(s.as_ref()))
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Object::Bytes(Arc::from(b.as_ref()))
    }

    pub fn list(items: Vec<Object>) -> Self {
        Object::List(Arc::new(RwLock::new(items)))
    }

    pub fn dict(entries: Vec<(Object, Object)>) -> Self {
        Object::Dict(Arc::new(RwLock::new(entries)))
    }

    pub fn opaque(type_name: impl AsRef<str>) -> Self {
        Object::Opaque(Arc::from(type_name.as_ref()))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Object::None)
    }

    /// Type name as the runtime reports it in exceptions.
    pub fn type_name(&self) -> &str {
        match self {
            Object::None => "NoneType",
            Object::Bool(_) => "bool",
            Object::Int(_) => "int",
            Object::Float(_) => "float",
            Object::Str(_) => "str",
            Object::Bytes(_) => "bytes",
            Object::List(_) => "list",
            Object::Dict(_) => "dict",
            Object::Opaque(name) => name.as_ref(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Object::Int(i) => Some(*i),
            Object::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Object::Float(f) => Some(*f),
            Object::Int(i) => Some(*i as f64),
            Object::Bool(b) => Some(*b as i64 as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::Str(s) => Some(s),
            _ => None,
        }
    }
}

// Containers print their length only: a cyclic list must not recurse here.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::None => write!(f, "None"),
            Object::Bool(b) => write!(f, "Bool({})", b),
            Object::Int(i) => write!(f, "Int({})", i),
            Object::Float(x) => write!(f, "Float({})", x),
            Object::Str(s) => write!(f, "Str({:?})", s),
            Object::Bytes(b) => write!(f, "Bytes(len={})", b.len()),
            Object::List(items) => write!(f, "List(len={})", items.read_recursive().len()),
            Object::Dict(entries) => write!(f, "Dict(len={})", entries.read_recursive().len()),
            Object::Opaque(name) => write!(f, "Opaque({})", name),
        }
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Int(v)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Float(v)
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Bool(v)
    }
}

impl From<&str> for Object {
    fn from(v: &str) -> Self {
        Object::str(v)
    }
}

impl From<String> for Object {
    fn from(v: String) -> Self {
        Object::Str(Arc::from(v))
    }
}
