//! # cellplate-expr
//!
//! Expression language for cellplate templates.
//!
//! This crate provides:
//! - Expression extraction and parsing (`{{var}}`, `{{var:op(..)}}`, `{{var|op(..)}}`)
//! - Dynamic values and case-insensitive binding tables
//! - Variable resolution (paths, indexers, arithmetic, collection counts)
//! - Native number and date pattern formatting
//! - Formatter and function registries with built-in handlers
//! - The evaluator that dispatches an expression against a cell
//!
//! ## Example
//!
//! ```rust
//! use cellplate_core::Worksheet;
//! use cellplate_expr::{parse, Bindings, Evaluator, Outcome, Registry, Resolver, Scope, Value};
//!
//! let mut bindings = Bindings::new();
//! bindings.insert("Name", "john");
//!
//! let registry = Registry::new();
//! let evaluator = Evaluator::new(Resolver::new(Scope::new(&bindings)), &registry);
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! let expr = parse("{{Name:upper}}").unwrap();
//! let outcome = evaluator.evaluate(&expr, &mut sheet.cell_mut_at(0, 0));
//! assert_eq!(outcome, Outcome::Resolved(Value::from("JOHN")));
//! ```

pub mod bindings;
pub mod builtins;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod format;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod value;

pub use bindings::{Bindings, Scope};
pub use error::{ExprError, ExprResult, HandlerError, HandlerResult};
pub use evaluator::{Evaluator, Outcome};
pub use expression::{ExpressionKind, ParsedExpression};
pub use parser::{contains_expression, extract_expressions, is_enhanced_syntax, parse, split_parameters};
pub use registry::{
    CellFunction, Formatter, FormatterRegistry, FunctionRegistry, Registry,
};
pub use resolver::{walk_path, GlobalResolver, Resolver};
pub use value::{MemberAccess, Value};
