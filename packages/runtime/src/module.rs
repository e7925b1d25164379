//! Modules: named collections of callable functions.
//!
//! The interpreter only sees the [`Module`] trait. Native modules wrap Rust
//! closures; WASM modules (see [`crate::wasm`]) wrap instantiated wasmtime
//! modules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::exception::Exception;
use crate::object::Object;

/// Where a module's code comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Native,
    Wasm,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Native => write!(f, "native"),
            ModuleKind::Wasm => write!(f, "wasm"),
        }
    }
}

/// A module loaded into the interpreter.
///
/// Calls are serialized by the interpreter's owner, but modules are shared
/// behind `Arc`, so implementations must still be `Send + Sync`.
pub trait Module: Send + Sync {
    /// The module's dotted name.
    fn name(&self) -> &str;

    fn kind(&self) -> ModuleKind;

    /// Check whether the module exports `function`.
    fn has_function(&self, function: &str) -> bool;

    /// Names of all exported functions, sorted.
    fn functions(&self) -> Vec<String>;

    /// Call an exported function.
    ///
    /// Callers check `has_function` first; implementations still return an
    /// `AttributeError` for unknown names.
    fn call(&self, function: &str, args: Args) -> Result<Object, Exception>;
}

/// Arguments to a function call.
#[derive(Debug, Clone, Default)]
pub struct Args {
    positional: Vec<Object>,
    keywords: Vec<(String, Object)>,
}

impl Args {
    pub fn new(positional: Vec<Object>, keywords: Vec<(String, Object)>) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    pub fn positional(&self) -> &[Object] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(String, Object)] {
        &self.keywords
    }

    pub fn get(&self, index: usize) -> Option<&Object> {
        self.positional.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&Object> {
        self.keywords
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Require exactly `count` positional arguments.
    pub fn expect_positional(&self, function: &str, count: usize) -> Result<(), Exception> {
        if self.positional.len() != count {
            return Err(Exception::type_error(format!(
                "{}() takes {} positional argument{} but {} were given",
                function,
                count,
                if count == 1 { "" } else { "s" },
                self.positional.len()
            )));
        }
        Ok(())
    }

    /// Reject any keyword not listed in `allowed`.
    pub fn allow_keywords(&self, function: &str, allowed: &[&str]) -> Result<(), Exception> {
        match self
            .keywords
            .iter()
            .find(|(key, _)| !allowed.contains(&key.as_str()))
        {
            Some((key, _)) => Err(Exception::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                function, key
            ))),
            None => Ok(()),
        }
    }
}

/// A native function: receives its arguments, returns an object or raises.
pub type NativeFn = Arc<dyn Fn(&Args) -> Result<Object, Exception> + Send + Sync>;

/// A module implemented by Rust closures.
pub struct NativeModule {
    name: String,
    functions: BTreeMap<String, NativeFn>,
}

impl NativeModule {
    /// Start building a native module.
    ///
    /// # Example
    ///
    /// ```rust
    /// use embedlink_runtime::{Module, NativeModule, Object};
    ///
    /// let module = NativeModule::builder("greeter")
    ///     .function("hello", |_args| Ok(Object::str("hello")))
    ///     .build();
    /// assert!(module.has_function("hello"));
    /// ```
    pub fn builder(name: impl Into<String>) -> NativeModuleBuilder {
        NativeModuleBuilder {
            name: name.into(),
            functions: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("name", &self.name)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Module for NativeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Native
    }

    fn has_function(&self, function: &str) -> bool {
        self.functions.contains_key(function)
    }

    fn functions(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    fn call(&self, function: &str, args: Args) -> Result<Object, Exception> {
        let f = self
            .functions
            .get(function)
            .ok_or_else(|| Exception::attribute(&self.name, function))?;
        f(&args)
    }
}

/// Builder for [`NativeModule`].
pub struct NativeModuleBuilder {
    name: String,
    functions: BTreeMap<String, NativeFn>,
}

impl NativeModuleBuilder {
    /// Add a function. A later function with the same name replaces an
    /// earlier one.
    #[must_use]
    pub fn function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Args) -> Result<Object, Exception> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn build(self) -> NativeModule {
        NativeModule {
            name: self.name,
            functions: self.functions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ExceptionKind;

    fn echo_module() -> NativeModule {
        NativeModule::builder("echo")
            .function("first", |args| {
                args.expect_positional("first", 1)?;
                Ok(args.get(0).cloned().unwrap_or(Object::None))
            })
            .function("kw", |args| {
                args.allow_keywords("kw", &["name"])?;
                Ok(args.keyword("name").cloned().unwrap_or(Object::None))
            })
            .build()
    }

    #[test]
    fn native_module_calls_closures() {
        let module = echo_module();
        let result = module
            .call("first", Args::new(vec![Object::Int(7)], vec![]))
            .unwrap();
        assert_eq!(result.as_int(), Some(7));
        assert_eq!(module.functions(), vec!["first", "kw"]);
        assert_eq!(module.kind(), ModuleKind::Native);
    }

    #[test]
    fn unknown_function_is_attribute_error() {
        let err = echo_module().call("nope", Args::default()).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Attribute);
        assert_eq!(err.name.as_deref(), Some("nope"));
    }

    #[test]
    fn arity_mismatch_is_type_error() {
        let err = echo_module()
            .call("first", Args::new(vec![Object::Int(1), Object::Int(2)], vec![]))
            .unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Type);
        assert_eq!(
            err.message,
            "first() takes 1 positional argument but 2 were given"
        );
    }

    #[test]
    fn unexpected_keyword_is_type_error() {
        let module = echo_module();
        let ok = module
            .call(
                "kw",
                Args::new(vec![], vec![("name".to_string(), Object::str("x"))]),
            )
            .unwrap();
        assert_eq!(ok.as_str(), Some("x"));

        let err = module
            .call(
                "kw",
                Args::new(vec![], vec![("other".to_string(), Object::None)]),
            )
            .unwrap_err();
        assert!(err.message.contains("unexpected keyword argument 'other'"));
    }
}
