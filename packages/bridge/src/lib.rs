//! # embedlink
//!
//! Call named functions inside an embedded interpreter from Rust and get
//! structured results back.
//!
//! The interpreter lives in the same process. It hosts native modules
//! (Rust closures, including the built-in `math_ops` and `sys`) and
//! WebAssembly modules found on the configured search paths.
//!
//! ## Pieces
//!
//! - [`RuntimeHandle`]: starts the interpreter on first use, serializes
//!   calls into it, and shuts it down
//! - [`Codec`]: converts host values to runtime objects and back, with a
//!   bound on nesting depth
//! - [`translate`]: maps runtime exceptions into the closed
//!   [`BridgeError`] taxonomy
//! - [`Evaluator`] and [`ScriptSession`]: one-line statements with a
//!   persistent namespace, for terminals
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use embedlink::{BridgeConfig, ErrorKind, RuntimeHandle, Value};
//!
//! let handle = RuntimeHandle::new(BridgeConfig::default().with_env(false));
//!
//! let five = handle
//!     .call("math_ops", "add", vec![Value::Int(2), Value::Int(3)], BTreeMap::new())
//!     .unwrap();
//! assert_eq!(five, Value::Int(5));
//!
//! let err = handle
//!     .call("missing_module", "f", vec![], BTreeMap::new())
//!     .unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::ModuleNotFound);
//! ```

mod codec;
mod config;
mod error;
mod handle;
mod request;
mod script;
mod session;
mod translate;

pub use codec::Codec;
pub use config::{BridgeConfig, ConfigError, PATH_ENV};
pub use error::{BridgeError, ErrorKind, Result};
pub use handle::{RuntimeHandle, RuntimeState};
pub use request::{CallId, CallRequest};
pub use script::{parse, parse_with_limit, Evaluator, Expr, ScriptError, Statement};
pub use session::{OutputListener, ScriptSession, Session, ENDED, STARTED};
pub use translate::translate;

pub use embedlink_runtime::{Module, NativeModule, Object};
pub use embedlink_value::{CodecError, Value};
