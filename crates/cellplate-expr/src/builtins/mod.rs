//! Built-in formatters and functions
//!
//! [`Registry::new`](crate::Registry::new) registers all of these. Each one
//! is written purely against the [`Formatter`](crate::Formatter) and
//! [`CellFunction`](crate::CellFunction) contracts, so user handlers can
//! replace any of them by registering under the same name.

pub mod formatters;
pub mod functions;

use crate::registry::{FormatterRegistry, FunctionRegistry};

/// Register the built-in formatters
pub fn register_formatters(registry: &mut FormatterRegistry) {
    registry.register_fn("upper", formatters::upper);
    registry.register_fn("lower", formatters::lower);
    registry.register_fn("titlecase", formatters::titlecase);
    registry.register_fn("mask", formatters::mask);
    registry.register_fn("phone", formatters::phone);
    registry.register_fn("truncate", formatters::truncate);
    registry.register_fn("currency", formatters::currency);
    registry.register_fn("number", formatters::number);
    registry.register_fn("percent", formatters::percent);
    registry.register_fn("date", formatters::date);
}

/// Register the built-in functions
pub fn register_functions(registry: &mut FunctionRegistry) {
    registry.register_fn("bold", functions::bold);
    registry.register_fn("italic", functions::italic);
    registry.register_fn("color", functions::color);
    registry.register_fn("background", functions::background);
    registry.register_fn("center", functions::center);
    registry.register_fn("border", functions::border);
    registry.register_fn("format", functions::format);
    registry.register_fn("link", functions::link);
    registry.register_fn("image", functions::image);
}
