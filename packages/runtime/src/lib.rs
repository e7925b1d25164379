//! The embedded interpreter behind embedlink.
//!
//! An [`Interpreter`] hosts two kinds of modules behind the [`Module`] trait:
//! - native modules built from Rust closures ([`NativeModule`])
//! - WebAssembly modules found on the search path and run with wasmtime
//!   ([`WasmModule`])
//!
//! Functions exchange [`Object`]s and fail with [`Exception`]s. The
//! interpreter itself is single-threaded; its owner serializes calls.
//!
//! # Example
//!
//! ```rust
//! use embedlink_runtime::{Args, Interpreter, InterpreterConfig, Object};
//!
//! let mut interp = Interpreter::new(InterpreterConfig::default());
//! let sum = interp
//!     .call("math_ops", "add", Args::new(vec![Object::Int(2), Object::Int(3)], vec![]))
//!     .unwrap();
//! assert_eq!(sum.as_int(), Some(5));
//! ```

pub mod builtins;
mod exception;
pub mod ident;
mod interpreter;
mod loader;
mod module;
mod object;
mod wasm;

pub use exception::{Exception, ExceptionKind};
pub use interpreter::{Interpreter, InterpreterConfig};
pub use loader::{ModuleLoader, MODULE_EXTENSIONS};
pub use module::{Args, Module, ModuleKind, NativeFn, NativeModule, NativeModuleBuilder};
pub use object::{DictRef, ListRef, Object};
pub use wasm::WasmModule;
