//! Cell styling types
//!
//! This module contains types for cell formatting:
//! - [`Style`] - Complete cell style
//! - [`FontStyle`] - Font settings
//! - [`FillStyle`] - Background fill
//! - [`BorderStyle`] - Cell borders
//! - [`Alignment`] - Text alignment
//! - [`Color`] - Color representation

mod alignment;
mod border;
mod color;
mod fill;
mod font;
mod number_format;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle, BorderStyle};
pub use color::Color;
pub use fill::FillStyle;
pub use font::{FontStyle, Underline};
pub use number_format::NumberFormat;

/// Complete cell style
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    /// Font settings
    pub font: FontStyle,
    /// Fill/background settings
    pub fill: FillStyle,
    /// Border settings
    pub border: BorderStyle,
    /// Text alignment
    pub alignment: Alignment,
    /// Number format
    pub number_format: NumberFormat,
}

impl Style {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Set font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    /// Set font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Set fill color (solid fill)
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::Solid { color };
        self
    }

    /// Set number format string
    pub fn number_format<S: Into<String>>(mut self, format: S) -> Self {
        self.number_format = NumberFormat::from_string(format);
        self
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    /// Set the same border on all four sides
    pub fn outline(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.border = BorderStyle::outline(style, color);
        self
    }

    /// Get a mutable reference to font settings
    pub fn font_mut(&mut self) -> &mut FontStyle {
        &mut self.font
    }

    /// Get a mutable reference to fill settings
    pub fn fill_mut(&mut self) -> &mut FillStyle {
        &mut self.fill
    }

    /// Get a mutable reference to border settings
    pub fn border_mut(&mut self) -> &mut BorderStyle {
        &mut self.border
    }

    /// Get a mutable reference to alignment settings
    pub fn alignment_mut(&mut self) -> &mut Alignment {
        &mut self.alignment
    }

    /// Whether this is the default style
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }
}
