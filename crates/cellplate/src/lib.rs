//! # cellplate
//!
//! Spreadsheet templates driven by `{{...}}` expressions in cell text.
//!
//! ## Features
//!
//! - Plain variables with paths, indexers and arithmetic: `{{Order.Lines[0].Price * Qty}}`
//! - Format expressions: `{{Total:currency(EUR)}}`, `{{Date:yyyy-MM-dd}}`
//! - Function expressions that style the cell: `{{Name|bold}}`, `{{Url|link}}`
//! - Collection metadata: `{{Items.Count}}`
//! - Pluggable formatters, functions, global resolver and range engine
//!
//! ## Example
//!
//! ```rust
//! use cellplate::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "{{Name|bold}}").unwrap();
//! sheet.set_cell_value("B1", "{{Items.Count}} items").unwrap();
//!
//! let mut template = Template::new(workbook);
//! template
//!     .add_variable("Name", "john")
//!     .add_variable("Items", vec![Value::from(1), Value::from(2), Value::from(3)]);
//! let result = template.generate();
//! assert!(result.is_success());
//!
//! let sheet = template.workbook().worksheet(0).unwrap();
//! assert_eq!(sheet.get_value("B1").unwrap(), CellValue::from("3 items"));
//! assert!(sheet.cell_style("A1").unwrap().unwrap().font.bold);
//! ```

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod options;
pub mod prelude;
mod processor;
pub mod template;

pub use diagnostics::{Diagnostics, MalformedExpression, SheetDiagnostics};
pub use engine::{
    substitute_standard, write_cell_text, ExpansionHooks, RangeEngine, Substitution,
    SubstitutionEngine,
};
pub use error::{Error, Result, TemplateError, TemplateErrorKind};
pub use options::TemplateOptions;
pub use template::{GenerateResult, GenerateStats, Template};

// Re-export core types
pub use cellplate_core::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, CellAddress, CellData, CellError,
    CellMut, CellValue, Color, FillStyle, FontStyle, HorizontalAlignment, Hyperlink,
    NumberFormat, Picture, PictureSource, Style, Underline, VerticalAlignment, Workbook,
    Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export expression types
pub use cellplate_expr::{
    extract_expressions, parse, Bindings, CellFunction, Evaluator, ExprError, ExpressionKind,
    Formatter, FormatterRegistry, FunctionRegistry, GlobalResolver, HandlerError, HandlerResult,
    MemberAccess, Outcome, ParsedExpression, Registry, Resolver, Scope, Value,
};
