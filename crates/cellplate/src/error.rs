//! Error types for cellplate

use std::fmt;

use cellplate_core::CellAddress;
use cellplate_expr::ExprError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop an operation
#[derive(Debug, Error)]
pub enum Error {
    /// Document model error
    #[error(transparent)]
    Core(#[from] cellplate_core::Error),

    /// Expression error
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// A range engine gave up
    #[error("Engine error: {0}")]
    Engine(String),
}

impl Error {
    /// Create an engine error with a message
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        Error::Engine(msg.into())
    }
}

/// Where a [`TemplateError`] was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateErrorKind {
    /// Malformed expression
    Syntax,
    /// A formatter or function failed
    Handler,
    /// Reported by the range engine
    Engine,
    /// The run was aborted
    Unexpected,
}

/// A non-fatal error recorded during generation
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateError {
    /// Human readable message
    pub message: String,
    /// Sheet the error belongs to, if any
    pub sheet: Option<String>,
    /// Cell the error belongs to, if any
    pub address: Option<CellAddress>,
    /// Error category
    pub kind: TemplateErrorKind,
}

impl TemplateError {
    /// Create an error that is not tied to a cell
    pub fn new<S: Into<String>>(kind: TemplateErrorKind, message: S) -> Self {
        Self {
            message: message.into(),
            sheet: None,
            address: None,
            kind,
        }
    }

    /// Create an error for a cell
    pub fn at_cell<S: Into<String>>(
        kind: TemplateErrorKind,
        sheet: &str,
        address: CellAddress,
        message: S,
    ) -> Self {
        Self {
            message: message.into(),
            sheet: Some(sheet.to_string()),
            address: Some(address),
            kind,
        }
    }

    /// `Sheet!A1` key of the cell, if the error has one
    pub fn cell_key(&self) -> Option<String> {
        match (&self.sheet, self.address) {
            (Some(sheet), Some(address)) => Some(format!("{}!{}", sheet, address)),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell_key() {
            Some(key) => write!(f, "{}: {}", key, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_error_display() {
        let err = TemplateError::at_cell(
            TemplateErrorKind::Handler,
            "Report",
            CellAddress::new(2, 1),
            "boom",
        );
        assert_eq!(err.cell_key().as_deref(), Some("Report!B3"));
        assert_eq!(err.to_string(), "Report!B3: boom");

        let err = TemplateError::new(TemplateErrorKind::Unexpected, "Unexpected error: x");
        assert_eq!(err.cell_key(), None);
        assert_eq!(err.to_string(), "Unexpected error: x");
    }
}
