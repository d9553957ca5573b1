//! Errors raised while parsing or executing module script.

use crate::runtime::value::Value;
use thiserror::Error;

/// Result type for script operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during parsing or execution.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Syntax error during parsing
    #[error("SyntaxError: {message} (at offset {offset})")]
    Syntax {
        /// What went wrong
        message: String,
        /// Byte offset of the offending token
        offset: usize,
    },

    /// Type error during execution
    #[error("TypeError: {0}")]
    Type(String),

    /// Reference error (undefined variable)
    #[error("ReferenceError: {0}")]
    Reference(String),

    /// Range error (call depth, invalid lengths)
    #[error("RangeError: {0}")]
    Range(String),

    /// A value raised by a `throw` statement
    #[error("{}", thrown_text(.0))]
    Thrown(Value),

    /// Internal interpreter error
    #[error("InternalError: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new syntax error
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }

    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    /// Create a new ReferenceError
    pub fn reference_error(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    /// Returns true for errors raised before any code ran.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    /// The human-readable message carried by this error.
    ///
    /// A thrown object contributes its `message` property, any other thrown
    /// value its own text; an empty result falls back to `"Syntax error"`.
    pub fn message(&self) -> String {
        let text = match self {
            Error::Thrown(value) => thrown_text(value),
            other => other.to_string(),
        };
        if text.is_empty() {
            "Syntax error".to_string()
        } else {
            text
        }
    }
}

fn thrown_text(value: &Value) -> String {
    if let Value::Object(obj) = value {
        if let Some(message) = obj.borrow().get("message") {
            return message.to_string();
        }
    }
    match value {
        Value::Undefined | Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::object::Object;

    #[test]
    fn test_thrown_object_uses_message_property() {
        let mut obj = Object::new();
        obj.set("message", Value::from("boom"));
        let err = Error::Thrown(Value::object(obj));
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_thrown_primitive_uses_its_text() {
        assert_eq!(Error::Thrown(Value::Number(42.0)).message(), "42");
    }

    #[test]
    fn test_empty_thrown_value_falls_back_to_syntax_label() {
        assert_eq!(Error::Thrown(Value::Undefined).message(), "Syntax error");
        assert_eq!(Error::Thrown(Value::from("")).message(), "Syntax error");
    }

    #[test]
    fn test_engine_errors_display_their_kind() {
        let err = Error::type_error("x is not a function");
        assert_eq!(err.message(), "TypeError: x is not a function");
        assert!(Error::syntax("Unexpected token", 3).is_syntax());
    }
}
