//! Expression evaluator
//!
//! Resolves an expression's variable and dispatches it to a formatter or
//! function. Handler failures are contained here: the cell shows
//! `Error: <message>` in the error color and the caller gets
//! [`Outcome::Failed`].

use std::panic::{catch_unwind, AssertUnwindSafe};

use cellplate_core::{CellMut, Color};
use tracing::{trace, warn};

use crate::error::HandlerResult;
use crate::expression::{ExpressionKind, ParsedExpression};
use crate::format::format_value;
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::value::Value;

/// Result of evaluating one expression
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The expression produced a value
    Resolved(Value),
    /// The variable could not be resolved; keep the original text
    Unresolved,
    /// A handler failed; the cell already shows the error
    Failed(String),
}

impl Outcome {
    /// The value, if resolved
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// Evaluates parsed expressions against a resolver and a registry
#[derive(Clone)]
pub struct Evaluator<'a> {
    resolver: Resolver<'a>,
    registry: &'a Registry,
    error_color: Color,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator; failed cells are colored red
    pub fn new(resolver: Resolver<'a>, registry: &'a Registry) -> Self {
        Self {
            resolver,
            registry,
            error_color: Color::RED,
        }
    }

    /// Set the font color used for failed cells
    pub fn with_error_color(mut self, color: Color) -> Self {
        self.error_color = color;
        self
    }

    /// The underlying resolver
    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    /// Evaluate `expr` for `cell`
    ///
    /// Format expressions never touch the cell unless their formatter fails.
    /// Function expressions mutate the cell and report the value it holds
    /// afterwards.
    pub fn evaluate(&self, expr: &ParsedExpression, cell: &mut CellMut<'_>) -> Outcome {
        trace!(expression = expr.original(), kind = %expr.kind(), "evaluating");

        match expr.kind() {
            ExpressionKind::Standard => match self.resolver.resolve(expr.variable()) {
                Some(value) => Outcome::Resolved(value),
                None => Outcome::Unresolved,
            },
            ExpressionKind::Format => {
                let Some(value) = self.resolve_operand(expr.variable()) else {
                    return Outcome::Unresolved;
                };
                self.apply_format(expr, value, cell)
            }
            ExpressionKind::Function => {
                let Some(value) = self.resolve_operand(expr.variable()) else {
                    return Outcome::Unresolved;
                };
                self.apply_function(expr, value, cell)
            }
        }
    }

    /// Resolve a variable, following values that are themselves `{{...}}` placeholders
    fn resolve_operand(&self, text: &str) -> Option<Value> {
        let value = self.resolver.resolve(text)?;
        if !value.is_placeholder() {
            return Some(value);
        }
        let inner = value
            .as_str()?
            .trim()
            .trim_start_matches("{{")
            .trim_end_matches("}}");
        trace!(variable = text, placeholder = inner, "retrying placeholder value");
        self.resolver.resolve(inner)
    }

    fn apply_format(&self, expr: &ParsedExpression, value: Value, cell: &mut CellMut<'_>) -> Outcome {
        let name = expr.operation().unwrap_or_default();

        if let Some(formatter) = self.registry.formatters.get(name) {
            return match guarded(|| formatter.format(&value, expr.parameters())) {
                Ok(formatted) => Outcome::Resolved(formatted),
                Err(message) => self.fail(cell, expr, message),
            };
        }

        match format_value(&value, name) {
            Some(formatted) => Outcome::Resolved(Value::String(formatted)),
            None => {
                warn!(
                    formatter = name,
                    value_type = value.type_name(),
                    "unknown formatter, value left unformatted"
                );
                Outcome::Resolved(value)
            }
        }
    }

    fn apply_function(
        &self,
        expr: &ParsedExpression,
        value: Value,
        cell: &mut CellMut<'_>,
    ) -> Outcome {
        let name = expr.operation().unwrap_or_default();

        let Some(function) = self.registry.functions.get(name) else {
            warn!(function = name, cell = %cell.key(), "unknown function");
            return Outcome::Resolved(Value::String(format!("Unknown function '{}'", name)));
        };

        match guarded(|| function.apply(cell, &value, expr.parameters())) {
            Ok(()) => Outcome::Resolved(Value::from(cell.value())),
            Err(message) => self.fail(cell, expr, message),
        }
    }

    fn fail(&self, cell: &mut CellMut<'_>, expr: &ParsedExpression, message: String) -> Outcome {
        warn!(
            cell = %cell.key(),
            expression = expr.original(),
            error = %message,
            "handler failed"
        );
        cell.set_value(format!("Error: {}", message));
        cell.style_mut().font.color = self.error_color;
        Outcome::Failed(message)
    }
}

/// Run a handler, turning both errors and panics into a message
fn guarded<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> HandlerResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.message().to_string()),
        Err(payload) => Err(payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string())),
    }
}
