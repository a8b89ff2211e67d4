//! Parsed expression types

use std::fmt;

/// The three shapes an expression can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    /// `{{variable}}`
    Standard,
    /// `{{variable:formatter(params)}}`
    Format,
    /// `{{variable|function(params)}}`
    Function,
}

impl ExpressionKind {
    /// Lowercase name used in logs and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionKind::Standard => "standard",
            ExpressionKind::Format => "format",
            ExpressionKind::Function => "function",
        }
    }
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `{{...}}` occurrence, split into its parts
///
/// Format and function expressions always carry a non-empty operation;
/// standard expressions never carry one. Construct through
/// [`parse`](crate::parser::parse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    kind: ExpressionKind,
    variable: String,
    operation: Option<String>,
    parameters: Vec<String>,
    original: String,
}

impl ParsedExpression {
    pub(crate) fn standard(variable: String, original: String) -> Self {
        Self {
            kind: ExpressionKind::Standard,
            variable,
            operation: None,
            parameters: Vec::new(),
            original,
        }
    }

    pub(crate) fn with_operation(
        kind: ExpressionKind,
        variable: String,
        operation: String,
        parameters: Vec<String>,
        original: String,
    ) -> Self {
        debug_assert!(kind != ExpressionKind::Standard && !operation.is_empty());
        Self {
            kind,
            variable,
            operation: Some(operation),
            parameters,
            original,
        }
    }

    /// Expression shape
    pub fn kind(&self) -> ExpressionKind {
        self.kind
    }

    /// Text naming the value to resolve (path, indexer or arithmetic)
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Formatter or function name
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Parameters in source order, unquoted
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The exact `{{...}}` text this was parsed from
    pub fn original(&self) -> &str {
        &self.original
    }

    /// True for format and function expressions
    pub fn is_enhanced(&self) -> bool {
        self.kind != ExpressionKind::Standard
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
