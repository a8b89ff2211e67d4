//! Mutable cell handle

use super::{CellAddress, CellData, CellValue};
use crate::hyperlink::Hyperlink;
use crate::picture::{Picture, PictureSource};
use crate::style::Style;
use crate::worksheet::Worksheet;

/// A mutable view of a single cell
///
/// Handlers receive a `CellMut` so they can change a cell's value and
/// appearance without knowing how the sheet stores it. The cell entry is only
/// created when something is written.
#[derive(Debug)]
pub struct CellMut<'a> {
    sheet: &'a mut Worksheet,
    row: u32,
    col: u16,
}

impl<'a> CellMut<'a> {
    pub(crate) fn new(sheet: &'a mut Worksheet, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }

    /// The cell's address
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }

    /// Name of the sheet holding the cell
    pub fn sheet_name(&self) -> &str {
        self.sheet.name()
    }

    /// Sheet-qualified key, e.g. `Sheet1!B2`
    pub fn key(&self) -> String {
        format!("{}!{}", self.sheet.name(), self.address())
    }

    fn data(&self) -> Option<&CellData> {
        self.sheet.cell_at(self.row, self.col)
    }

    fn data_mut(&mut self) -> &mut CellData {
        self.sheet.data_entry(self.row, self.col)
    }

    /// Current value (empty if the cell does not exist)
    pub fn value(&self) -> CellValue {
        self.data().map(|c| c.value.clone()).unwrap_or_default()
    }

    /// The cell's text if it holds a string
    pub fn text(&self) -> Option<&str> {
        self.data().and_then(|c| c.text())
    }

    /// Replace the value
    pub fn set_value<V: Into<CellValue>>(&mut self, value: V) {
        self.data_mut().value = value.into();
    }

    /// Store a formula, adding the leading `=` if missing
    pub fn set_formula(&mut self, formula: &str) {
        self.data_mut().value = CellValue::formula(formula);
    }

    /// Clear the value, keeping style and hyperlink
    pub fn clear_value(&mut self) {
        if let Some(data) = self.sheet.cell_at_mut(self.row, self.col) {
            data.value = CellValue::Empty;
        }
    }

    /// Current style (default if the cell does not exist)
    pub fn style(&self) -> Style {
        self.data().map(|c| c.style.clone()).unwrap_or_default()
    }

    /// Mutable access to the style
    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.data_mut().style
    }

    /// Replace the style
    pub fn set_style(&mut self, style: Style) {
        self.data_mut().style = style;
    }

    /// Attached hyperlink
    pub fn hyperlink(&self) -> Option<&Hyperlink> {
        self.data().and_then(|c| c.hyperlink.as_ref())
    }

    /// Attach a hyperlink, replacing any previous one
    pub fn set_hyperlink(&mut self, link: Hyperlink) {
        self.data_mut().hyperlink = Some(link);
    }

    /// Place a picture anchored at this cell and return it for sizing
    pub fn add_picture(&mut self, source: PictureSource) -> &mut Picture {
        let anchor = self.address();
        self.sheet.push_picture(Picture::new(source, anchor))
    }
}
