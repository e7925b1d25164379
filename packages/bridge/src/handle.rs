//! The runtime handle: lifecycle management and call dispatch.
//!
//! One [`RuntimeHandle`] owns one embedded interpreter. The interpreter
//! runs on whichever thread is calling, one call at a time: every
//! operation that touches it holds the handle's gate for its whole
//! duration. The lifecycle state is mirrored outside the gate so
//! [`RuntimeHandle::state`] never waits behind a running call.
//!
//! ```text
//! Uninitialized ──► Starting ──► Ready ──► ShutDown
//!                       │                     ▲
//!                       └──► Failed ──────────┘ (shutdown only)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use embedlink_runtime::{Args, Interpreter, InterpreterConfig, Module, Object};
use embedlink_value::Value;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::codec::Codec;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::request::{CallId, CallRequest};
use crate::translate::translate;

/// Lifecycle state of a runtime handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    /// Nothing has been started yet.
    Uninitialized,
    /// Startup is in progress.
    Starting,
    /// The interpreter is running and accepting calls.
    Ready,
    /// Startup failed. Terminal.
    Failed,
    /// The interpreter was shut down. Terminal.
    ShutDown,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuntimeState::Uninitialized => "uninitialized",
            RuntimeState::Starting => "starting",
            RuntimeState::Ready => "ready",
            RuntimeState::Failed => "failed",
            RuntimeState::ShutDown => "shut down",
        };
        f.write_str(s)
    }
}

/// What the gate protects.
enum Slot {
    Uninitialized {
        /// Host modules to register once the interpreter exists.
        pending: Vec<Arc<dyn Module>>,
    },
    Ready(Interpreter),
    Failed(String),
    ShutDown,
}

static GLOBAL: OnceLock<Arc<RuntimeHandle>> = OnceLock::new();

/// Handle to an embedded interpreter.
///
/// The interpreter starts lazily on the first call (or an explicit
/// [`ensure_ready`](Self::ensure_ready)) and lives until
/// [`shutdown`](Self::shutdown).
///
/// # Example
///
/// ```rust
/// use embedlink::{BridgeConfig, CallRequest, RuntimeHandle, Value};
///
/// let handle = RuntimeHandle::new(BridgeConfig::default().with_env(false));
/// let sum = handle.invoke(&CallRequest::new("math_ops", "add").with_args(vec![2i64, 3])).unwrap();
/// assert_eq!(sum, Value::Int(5));
///
/// handle.shutdown();
/// assert!(handle.invoke(&CallRequest::new("math_ops", "add")).is_err());
/// ```
pub struct RuntimeHandle {
    config: BridgeConfig,
    codec: Codec,
    gate: Mutex<Slot>,
    state: RwLock<RuntimeState>,
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

impl RuntimeHandle {
    /// Create a handle with its own interpreter. Nothing starts until the
    /// first call.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            codec: Codec::new(config.max_depth),
            config,
            gate: Mutex::new(Slot::Uninitialized {
                pending: Vec::new(),
            }),
            state: RwLock::new(RuntimeState::Uninitialized),
        }
    }

    /// The process-wide handle, created with the default config on first
    /// use.
    pub fn global() -> Arc<RuntimeHandle> {
        GLOBAL
            .get_or_init(|| Arc::new(RuntimeHandle::new(BridgeConfig::default())))
            .clone()
    }

    /// Create the process-wide handle with `config`.
    ///
    /// Returns `false` (and leaves the existing handle alone) when the
    /// global handle already exists.
    pub fn init_global(config: BridgeConfig) -> bool {
        let mut created = false;
        GLOBAL.get_or_init(|| {
            created = true;
            Arc::new(RuntimeHandle::new(config))
        });
        if !created {
            tracing::warn!("global runtime already exists; ignoring new config");
        }
        created
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Current lifecycle state. Never blocks behind a running call.
    pub fn state(&self) -> RuntimeState {
        *self.state.read()
    }

    fn set_state(&self, state: RuntimeState) {
        *self.state.write() = state;
    }

    /// Start the interpreter if it has not been started.
    ///
    /// Returns immediately once Ready. Callers arriving while another
    /// thread is starting the interpreter wait for it to finish.
    pub fn ensure_ready(&self) -> Result<()> {
        let mut slot = self.gate.lock();
        self.ready(&mut slot).map(|_| ())
    }

    /// Borrow the running interpreter, starting it first if needed.
    ///
    /// A panic during startup leaves the handle Failed, like any other
    /// startup error.
    fn ready<'s>(&self, slot: &'s mut Slot) -> Result<&'s mut Interpreter> {
        if let Slot::Uninitialized { pending } = &mut *slot {
            let pending = std::mem::take(pending);
            *slot = match panic::catch_unwind(AssertUnwindSafe(|| self.start(pending))) {
                Ok(started) => started,
                Err(payload) => {
                    let reason = format!("startup panicked: {}", panic_message(payload.as_ref()));
                    tracing::error!(reason = %reason, "runtime startup failed");
                    self.set_state(RuntimeState::Failed);
                    Slot::Failed(reason)
                }
            };
        }

        match slot {
            Slot::Ready(interpreter) => Ok(interpreter),
            Slot::Failed(reason) => Err(BridgeError::unavailable(format!(
                "runtime failed to start: {}",
                reason
            ))),
            Slot::ShutDown => Err(BridgeError::unavailable("runtime has been shut down")),
            Slot::Uninitialized { .. } => Err(BridgeError::unavailable("runtime not started")),
        }
    }

    fn start(&self, pending: Vec<Arc<dyn Module>>) -> Slot {
        self.set_state(RuntimeState::Starting);
        tracing::info!("starting embedded runtime");

        let mut interpreter = Interpreter::new(InterpreterConfig {
            search_paths: self.config.effective_search_paths(),
            working_dir: self.config.working_dir.clone(),
        });
        for module in pending {
            interpreter.register(module);
        }

        for package in &self.config.packages {
            if let Err(e) = interpreter.import(package) {
                let reason = format!("cannot import package '{}': {}", package, e);
                tracing::error!(package = %package, error = %e, "runtime startup failed");
                self.set_state(RuntimeState::Failed);
                return Slot::Failed(reason);
            }
        }

        tracing::info!(instance = %interpreter.id(), "embedded runtime ready");
        self.set_state(RuntimeState::Ready);
        Slot::Ready(interpreter)
    }

    /// Register a host module.
    ///
    /// Before startup the module is held until the interpreter is created;
    /// on a running interpreter it is registered at once.
    pub fn register_module(&self, module: impl Module + 'static) -> Result<()> {
        let module: Arc<dyn Module> = Arc::new(module);
        let mut slot = self.gate.lock();
        match &mut *slot {
            Slot::Uninitialized { pending } => {
                tracing::debug!(module = module.name(), "queued host module");
                pending.push(module);
                Ok(())
            }
            Slot::Ready(interpreter) => {
                tracing::debug!(module = module.name(), "registered host module");
                interpreter.register(module);
                Ok(())
            }
            Slot::Failed(reason) => Err(BridgeError::unavailable(format!(
                "runtime failed to start: {}",
                reason
            ))),
            Slot::ShutDown => Err(BridgeError::unavailable("runtime has been shut down")),
        }
    }

    /// Run a call inside the interpreter and decode its result.
    pub fn invoke(&self, request: &CallRequest) -> Result<Value> {
        let id = CallId::new();
        let span = tracing::debug_span!(
            "call",
            id = %id,
            module = request.module(),
            function = request.function()
        );
        let _enter = span.enter();

        let result = self.dispatch(request);
        match &result {
            Ok(_) => tracing::debug!("call returned"),
            Err(e) => tracing::warn!(kind = %e.kind(), error = %e, "call failed"),
        }
        result
    }

    fn dispatch(&self, request: &CallRequest) -> Result<Value> {
        let mut slot = self.gate.lock();
        let interpreter = self.ready(&mut slot)?;

        let args = self.encode_args(request)?;
        tracing::debug!("invoking");

        let object = interpreter
            .call(request.module(), request.function(), args)
            .map_err(|e| translate(e, request.module(), request.function()))?;

        self.codec.from_object(&object).map_err(BridgeError::decoding)
    }

    fn encode_args(&self, request: &CallRequest) -> Result<Args> {
        let positional = request
            .args()
            .iter()
            .map(|v| self.codec.to_object(v))
            .collect::<std::result::Result<Vec<Object>, _>>()
            .map_err(BridgeError::encoding)?;
        let keywords = request
            .kwargs()
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.codec.to_object(v)?)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(BridgeError::encoding)?;
        Ok(Args::new(positional, keywords))
    }

    /// `invoke` with the request spelled out.
    pub fn call(
        &self,
        module: &str,
        function: &str,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> Result<Value> {
        self.invoke(
            &CallRequest::new(module, function)
                .with_args(args)
                .with_kwargs(kwargs),
        )
    }

    /// `invoke`, then decode the result into `R`.
    pub fn invoke_as<R: DeserializeOwned>(&self, request: &CallRequest) -> Result<R> {
        let value = self.invoke(request)?;
        self.codec.decode(value).map_err(BridgeError::decoding)
    }

    /// Run `f` against the running interpreter, starting it if needed.
    ///
    /// Holds the gate for the duration of `f`.
    pub fn with_interpreter<R>(&self, f: impl FnOnce(&mut Interpreter) -> R) -> Result<R> {
        let mut slot = self.gate.lock();
        let interpreter = self.ready(&mut slot)?;
        Ok(f(interpreter))
    }

    /// Id of the running interpreter, if there is one.
    pub fn instance_id(&self) -> Option<Uuid> {
        match &*self.gate.lock() {
            Slot::Ready(interpreter) => Some(interpreter.id()),
            _ => None,
        }
    }

    /// Stop the interpreter. Safe to call any number of times, from any
    /// state; waits for a call in progress to finish.
    pub fn shutdown(&self) {
        let mut slot = self.gate.lock();
        let previous = std::mem::replace(&mut *slot, Slot::ShutDown);
        self.set_state(RuntimeState::ShutDown);
        match previous {
            Slot::ShutDown => {}
            Slot::Ready(interpreter) => {
                tracing::info!(instance = %interpreter.id(), "embedded runtime shut down");
                drop(interpreter);
            }
            _ => tracing::info!("runtime shut down before it was running"),
        }
    }
}

#[cfg(feature = "async")]
impl RuntimeHandle {
    /// Run [`invoke`](Self::invoke) on tokio's blocking pool.
    ///
    /// Dropping the future does not cancel a call already running.
    pub async fn invoke_async(self: &Arc<Self>, request: CallRequest) -> Result<Value> {
        let handle = Arc::clone(self);
        tokio::task::spawn_blocking(move || handle.invoke(&request))
            .await
            .map_err(|e| BridgeError::unavailable(format!("call task failed: {}", e)))?
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
