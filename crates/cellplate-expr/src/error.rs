//! Expression error types

use thiserror::Error;

/// Result type for expression operations
pub type ExprResult<T> = std::result::Result<T, ExprError>;

/// Errors raised while parsing expressions or building values
#[derive(Debug, Error)]
pub enum ExprError {
    /// Text is not a well-formed `{{...}}` expression
    #[error("Malformed expression '{expression}': {reason}")]
    Malformed {
        /// The offending text
        expression: String,
        /// What is wrong with it
        reason: String,
    },

    /// A value could not be converted for binding
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document model error
    #[error(transparent)]
    Core(#[from] cellplate_core::Error),
}

impl ExprError {
    pub(crate) fn malformed<E: Into<String>, R: Into<String>>(expression: E, reason: R) -> Self {
        ExprError::Malformed {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Result type returned by formatters and functions
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

/// Failure reported by a formatter or function
///
/// The message is written into the cell as `Error: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error with a message
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<cellplate_core::Error> for HandlerError {
    fn from(err: cellplate_core::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
