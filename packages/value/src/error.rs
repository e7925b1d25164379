//! Error types for the value layer.

use thiserror::Error;

/// Errors raised while converting to or from [`Value`](crate::Value).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Containers nest deeper than the configured limit.
    #[error("value nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// The source holds something the boundary cannot represent.
    #[error("cannot represent {what}: {message}")]
    Unrepresentable { what: String, message: String },

    /// The value does not have the shape the target type expects.
    #[error("value does not match expected type: {0}")]
    Mismatch(String),
}

impl CodecError {
    pub fn unrepresentable(what: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::Unrepresentable {
            what: what.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_deep_display() {
        let e = CodecError::TooDeep { limit: 64 };
        assert_eq!(e.to_string(), "value nests deeper than 64 levels");
    }

    #[test]
    fn unrepresentable_display() {
        let e = CodecError::unrepresentable("integer 18446744073709551615", "exceeds i64");
        let display = e.to_string();
        assert!(display.contains("cannot represent"));
        assert!(display.contains("exceeds i64"));
    }
}
