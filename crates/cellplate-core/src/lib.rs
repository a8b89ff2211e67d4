//! # cellplate-core
//!
//! Document model that cellplate templates are filled into.
//!
//! This crate provides the types the template engine reads and writes:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, dates, errors, formulas)
//! - [`CellAddress`] - Cell addressing
//! - [`Style`] - Cell formatting (fonts, fills, borders, alignment, number formats)
//! - [`Hyperlink`] and [`Picture`] - Links and images attached to cells
//! - [`Workbook`], [`Worksheet`] - The main document structures
//! - [`CellMut`] - A mutable handle on one cell, handed to template functions
//!
//! ## Example
//!
//! ```rust
//! use cellplate_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! // Using string addresses
//! sheet.set_cell_value("A1", "{{Name}}").unwrap();
//! sheet.set_cell_value("B1", 42.0).unwrap();
//!
//! // Or using a cell handle (0-based indices)
//! let mut cell = sheet.cell_mut_at(1, 0);
//! cell.set_value("World");
//! cell.style_mut().font.bold = true;
//! assert_eq!(cell.value(), CellValue::string("World"));
//! ```

pub mod cell;
pub mod error;
pub mod hyperlink;
pub mod picture;
pub mod style;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellData, CellError, CellMut, CellValue, SharedString};
pub use error::{Error, Result};
pub use hyperlink::Hyperlink;
pub use picture::{Picture, PictureSource};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

// Re-export all style types for convenience
pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, Style, Underline, VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
