//! Mapping runtime exceptions into bridge errors.

use embedlink_runtime::{Exception, ExceptionKind};

use crate::error::BridgeError;

/// Translate an exception raised while calling `module.function`.
///
/// Only a lookup failure for the requested names counts as a missing
/// module or function. The same exception kinds raised from inside a
/// running function (they carry a traceback frame) are native exceptions
/// like any other.
pub fn translate(exception: Exception, module: &str, function: &str) -> BridgeError {
    let lookup = exception.traceback.is_empty();
    let requested = |name: &str| lookup && exception.name.as_deref() == Some(name);

    match exception.kind {
        ExceptionKind::ModuleNotFound if requested(module) => BridgeError::ModuleNotFound {
            module: module.to_string(),
        },
        ExceptionKind::Attribute if requested(function) => BridgeError::FunctionNotFound {
            module: module.to_string(),
            function: function.to_string(),
        },
        _ => BridgeError::NativeException {
            exception: exception.kind.name().to_string(),
            trace: exception.render_traceback(),
            message: exception.message,
        },
    }
}
