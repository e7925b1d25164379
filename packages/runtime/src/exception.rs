//! Exceptions raised inside the embedded runtime.

use std::fmt;

use thiserror::Error;

/// Category of a runtime exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    /// No module with the requested name could be found.
    ModuleNotFound,
    /// A module has no attribute with the requested name.
    Attribute,
    /// A module was found but could not be loaded.
    Import,
    /// An argument had the wrong type or count.
    Type,
    /// An argument had the right type but an unusable value.
    Value,
    ZeroDivision,
    Overflow,
    /// A WASM trap.
    Trap,
    /// A native function panicked.
    Panic,
}

impl ExceptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExceptionKind::ModuleNotFound => "ModuleNotFoundError",
            ExceptionKind::Attribute => "AttributeError",
            ExceptionKind::Import => "ImportError",
            ExceptionKind::Type => "TypeError",
            ExceptionKind::Value => "ValueError",
            ExceptionKind::ZeroDivision => "ZeroDivisionError",
            ExceptionKind::Overflow => "OverflowError",
            ExceptionKind::Trap => "Trap",
            ExceptionKind::Panic => "Panic",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An exception raised while importing a module or running a function.
///
/// `traceback` holds one entry per frame the exception unwound through,
/// innermost first. `detail` holds extra diagnostic text from the engine
/// (for traps, the WASM backtrace).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: String,
    /// The missing name for `ModuleNotFound` / `Attribute`.
    pub name: Option<String>,
    pub traceback: Vec<String>,
    pub detail: Option<String>,
}

impl Exception {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            name: None,
            traceback: Vec::new(),
            detail: None,
        }
    }

    pub fn module_not_found(module: &str) -> Self {
        Self {
            name: Some(module.to_string()),
            ..Self::new(
                ExceptionKind::ModuleNotFound,
                format!("No module named '{}'", module),
            )
        }
    }

    pub fn attribute(module: &str, attribute: &str) -> Self {
        Self {
            name: Some(attribute.to_string()),
            ..Self::new(
                ExceptionKind::Attribute,
                format!("module '{}' has no attribute '{}'", module, attribute),
            )
        }
    }

    pub fn import(module: &str, message: impl fmt::Display) -> Self {
        Self::new(
            ExceptionKind::Import,
            format!("cannot load module '{}': {}", module, message),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Type, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Value, message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ZeroDivision, message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Overflow, message)
    }

    pub fn trap(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(ExceptionKind::Trap, message)
        }
    }

    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Panic, message)
    }

    /// Record that the exception unwound through `frame`.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.traceback.push(frame.into());
        self
    }

    /// Render the traceback, outermost frame first, followed by any engine
    /// detail. Returns `None` when there is nothing to show.
    pub fn render_traceback(&self) -> Option<String> {
        if self.traceback.is_empty() && self.detail.is_none() {
            return None;
        }

        let mut out = String::from("Traceback (most recent call last):\n");
        for frame in self.traceback.iter().rev() {
            out.push_str("  in ");
            out.push_str(frame);
            out.push('\n');
        }
        if let Some(detail) = &self.detail {
            for line in detail.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(&self.to_string());
        Some(out)
    }
}
