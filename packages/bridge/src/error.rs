//! Error types for the bridge.

use std::fmt;

use embedlink_value::CodecError;
use thiserror::Error;

/// The closed set of failure categories a call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ModuleNotFound,
    FunctionNotFound,
    NativeException,
    EncodingTooDeep,
    EncodingFailed,
    DecodingFailed,
    RuntimeUnavailable,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::ModuleNotFound => "ModuleNotFound",
            ErrorKind::FunctionNotFound => "FunctionNotFound",
            ErrorKind::NativeException => "NativeException",
            ErrorKind::EncodingTooDeep => "EncodingTooDeep",
            ErrorKind::EncodingFailed => "EncodingFailed",
            ErrorKind::DecodingFailed => "DecodingFailed",
            ErrorKind::RuntimeUnavailable => "RuntimeUnavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by bridge calls.
///
/// Every variant displays as `Kind: message`. Native exceptions use the
/// runtime's exception name as their kind (`ZeroDivisionError: ...`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The requested module does not exist in the runtime.
    #[error("ModuleNotFound: no module named '{module}'")]
    ModuleNotFound { module: String },

    /// The module exists but has no such function.
    #[error("FunctionNotFound: module '{module}' has no function '{function}'")]
    FunctionNotFound { module: String, function: String },

    /// The function raised inside the runtime.
    #[error("{exception}: {message}")]
    NativeException {
        exception: String,
        message: String,
        trace: Option<String>,
    },

    /// An argument nests deeper than the codec allows.
    #[error("EncodingTooDeep: argument nests deeper than {limit} levels")]
    EncodingTooDeep { limit: usize },

    /// An argument could not be represented in the runtime.
    #[error("EncodingFailed: {0}")]
    EncodingFailed(String),

    /// The function returned something the host cannot represent.
    #[error("DecodingFailed: {0}")]
    DecodingFailed(String),

    /// The runtime is not running: startup failed or it was shut down.
    #[error("RuntimeUnavailable: {0}")]
    RuntimeUnavailable(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::ModuleNotFound { .. } => ErrorKind::ModuleNotFound,
            BridgeError::FunctionNotFound { .. } => ErrorKind::FunctionNotFound,
            BridgeError::NativeException { .. } => ErrorKind::NativeException,
            BridgeError::EncodingTooDeep { .. } => ErrorKind::EncodingTooDeep,
            BridgeError::EncodingFailed(_) => ErrorKind::EncodingFailed,
            BridgeError::DecodingFailed(_) => ErrorKind::DecodingFailed,
            BridgeError::RuntimeUnavailable(_) => ErrorKind::RuntimeUnavailable,
        }
    }

    /// The runtime traceback, for native exceptions that carry one.
    pub fn trace(&self) -> Option<&str> {
        match self {
            BridgeError::NativeException { trace, .. } => trace.as_deref(),
            _ => None,
        }
    }

    /// Map a codec failure on the way into the runtime.
    pub fn encoding(err: CodecError) -> Self {
        match err {
            CodecError::TooDeep { limit } => BridgeError::EncodingTooDeep { limit },
            other => BridgeError::EncodingFailed(other.to_string()),
        }
    }

    /// Map a codec failure on the way back out. Always `DecodingFailed`.
    pub fn decoding(err: CodecError) -> Self {
        BridgeError::DecodingFailed(err.to_string())
    }

    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        BridgeError::RuntimeUnavailable(reason.into())
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_kind_then_message() {
        let e = BridgeError::ModuleNotFound {
            module: "numpy".into(),
        };
        assert_eq!(e.to_string(), "ModuleNotFound: no module named 'numpy'");

        let e = BridgeError::NativeException {
            exception: "ValueError".into(),
            message: "math domain error".into(),
            trace: None,
        };
        assert_eq!(e.to_string(), "ValueError: math domain error");
        assert_eq!(e.kind(), ErrorKind::NativeException);
    }

    #[test]
    fn codec_errors_split_by_direction() {
        let deep = CodecError::TooDeep { limit: 8 };
        assert_eq!(
            BridgeError::encoding(deep.clone()),
            BridgeError::EncodingTooDeep { limit: 8 }
        );
        assert_eq!(BridgeError::decoding(deep).kind(), ErrorKind::DecodingFailed);

        let other = CodecError::unrepresentable("object", "no host type");
        assert_eq!(BridgeError::encoding(other).kind(), ErrorKind::EncodingFailed);
    }

    #[test]
    fn trace_only_on_native_exceptions() {
        let e = BridgeError::NativeException {
            exception: "Trap".into(),
            message: "unreachable".into(),
            trace: Some("Traceback".into()),
        };
        assert_eq!(e.trace(), Some("Traceback"));
        assert_eq!(BridgeError::unavailable("gone").trace(), None);
    }
}
