//! Per-cell data

use super::CellValue;
use crate::hyperlink::Hyperlink;
use crate::style::Style;

/// Complete data for a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// The cell's style
    pub style: Style,
    /// Hyperlink attached to the cell
    pub hyperlink: Option<Hyperlink>,
}

impl CellData {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Create a new cell with a value and style
    pub fn with_style(value: CellValue, style: Style) -> Self {
        Self {
            value,
            style,
            hyperlink: None,
        }
    }

    /// Check if this cell is effectively empty (no value, default style, no link)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style.is_default() && self.hyperlink.is_none()
    }

    /// The cell's text if it holds a string
    pub fn text(&self) -> Option<&str> {
        self.value.as_string()
    }
}
