//! Call requests.

use std::collections::BTreeMap;
use std::fmt;

use embedlink_value::Value;
use uuid::Uuid;

/// Identifies one call in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A function call to run inside the runtime.
///
/// Fields are fixed once built; the `with_*` methods consume the request
/// and return a new one.
///
/// ```rust
/// use embedlink::CallRequest;
///
/// let request = CallRequest::new("math_ops", "sum")
///     .with_arg(vec![1i64, 2, 3])
///     .with_kwarg("start", 10i64);
/// assert_eq!(request.target(), "math_ops.sum");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallRequest {
    module: String,
    function: String,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallRequest {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            ..Default::default()
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn with_kwargs(mut self, kwargs: BTreeMap<String, Value>) -> Self {
        self.kwargs.extend(kwargs);
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, Value> {
        &self.kwargs
    }

    /// `module.function`, for messages.
    pub fn target(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }
}
