//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellMut, CellValue};
use crate::error::{Error, Result};
use crate::hyperlink::Hyperlink;
use crate::picture::Picture;
use crate::style::Style;
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Cells are kept in row-major order so iteration matches the order a
/// template is read in.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cells keyed by (row, col)
    cells: BTreeMap<(u32, u16), CellData>,
    /// Pictures placed on the sheet
    pictures: Vec<Picture>,
    /// Sheet is visible
    visible: bool,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            pictures: Vec::new(),
            visible: true,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the sheet
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&(row, col))
    }

    /// Get a mutable cell by row and column indices
    pub fn cell_at_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.cells.get_mut(&(row, col))
    }

    pub(crate) fn data_entry(&mut self, row: u32, col: u16) -> &mut CellData {
        self.cells.entry((row, col)).or_default()
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Get the style applied to a cell by address, if the cell exists
    pub fn cell_style(&self, address: &str) -> Result<Option<&Style>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_style_at(addr.row, addr.col))
    }

    /// Get the style applied to a cell, if the cell exists
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        self.cells.get(&(row, col)).map(|c| &c.style)
    }

    /// Get the hyperlink attached to a cell
    pub fn hyperlink_at(&self, row: u32, col: u16) -> Option<&Hyperlink> {
        self.cells.get(&(row, col)).and_then(|c| c.hyperlink.as_ref())
    }

    /// Mutable handle on a cell by address string
    pub fn cell_mut(&mut self, address: &str) -> Result<CellMut<'_>> {
        let addr = CellAddress::parse(address)?;
        self.validate_cell_position(addr.row, addr.col)?;
        Ok(CellMut::new(self, addr.row, addr.col))
    }

    /// Mutable handle on a cell by indices
    pub fn cell_mut_at(&mut self, row: u32, col: u16) -> CellMut<'_> {
        CellMut::new(self, row, col)
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.data_entry(row, col).value = value.into();
        Ok(())
    }

    /// Set a cell formula by address string
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.validate_cell_position(addr.row, addr.col)?;
        self.data_entry(addr.row, addr.col).value = CellValue::formula(formula);
        Ok(())
    }

    /// Set a cell style by address string
    pub fn set_cell_style(&mut self, address: &str, style: &Style) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_style_at(addr.row, addr.col, style)
    }

    /// Set a cell style by row and column indices
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.data_entry(row, col).style = style.clone();
        Ok(())
    }

    /// Replace a cell's complete data
    pub fn set_cell_data_at(&mut self, row: u32, col: u16, data: CellData) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.insert((row, col), data);
        Ok(())
    }

    /// Clear a cell by indices
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(&(row, col));
    }

    /// Insert `count` empty rows before `at`, shifting cells and picture anchors down
    pub fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        if let Some(&(last_row, _)) = self.cells.keys().next_back() {
            let shifted = last_row.saturating_add(count);
            if last_row >= at && shifted >= MAX_ROWS {
                return Err(Error::RowOutOfBounds(shifted, MAX_ROWS - 1));
            }
        }

        let moved = self.cells.split_off(&(at, 0));
        self.cells
            .extend(moved.into_iter().map(|((row, col), data)| ((row + count, col), data)));

        for picture in &mut self.pictures {
            if picture.anchor.row >= at {
                picture.anchor.row += count;
            }
        }
        Ok(())
    }

    /// Iterate over all existing cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter().map(|(&(row, col), data)| (row, col, data))
    }

    /// Iterate over the addresses and text of string cells in row-major order
    pub fn text_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.cells.iter().filter_map(|(&(row, col), data)| {
            data.text().map(|text| (CellAddress::new(row, col), text))
        })
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Highest used row index, if any cell exists
    pub fn max_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|&(row, _)| row)
    }

    // === Pictures ===

    /// Pictures placed on the sheet
    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    /// Place a picture on the sheet
    pub fn add_picture(&mut self, picture: Picture) {
        self.pictures.push(picture);
    }

    pub(crate) fn push_picture(&mut self, picture: Picture) -> &mut Picture {
        let index = self.pictures.len();
        self.pictures.push(picture);
        &mut self.pictures[index]
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::PictureSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_get_values() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value("A1", "Hello").unwrap();
        ws.set_cell_value("B2", 42.0).unwrap();
        ws.set_cell_formula("C3", "A1&B2").unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.get_value_at(1, 1), CellValue::Number(42.0));
        assert_eq!(ws.get_value("C3").unwrap().formula_text(), Some("=A1&B2"));
        assert_eq!(ws.get_value("Z9").unwrap(), CellValue::Empty);
        assert_eq!(ws.cell_count(), 3);
    }

    #[test]
    fn test_bounds_are_checked() {
        let mut ws = Worksheet::new("Sheet1");
        assert!(ws.set_cell_value_at(MAX_ROWS, 0, 1.0).is_err());
        assert!(ws.set_cell_value_at(0, MAX_COLS, 1.0).is_err());
        assert!(ws.set_cell_value("not an address", 1.0).is_err());
    }

    #[test]
    fn test_text_cells_row_major() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value("B2", "b2").unwrap();
        ws.set_cell_value("A2", "a2").unwrap();
        ws.set_cell_value("C1", "c1").unwrap();
        ws.set_cell_value("A3", 7.0).unwrap();

        let texts: Vec<_> = ws
            .text_cells()
            .map(|(addr, text)| (addr.to_string(), text.to_string()))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("C1".to_string(), "c1".to_string()),
                ("A2".to_string(), "a2".to_string()),
                ("B2".to_string(), "b2".to_string()),
            ]
        );
    }

    #[test]
    fn test_insert_rows_shifts_cells_and_pictures() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value("A1", "header").unwrap();
        ws.set_cell_value("A2", "row").unwrap();
        ws.set_cell_value("B3", "footer").unwrap();
        ws.add_picture(Picture::new(
            PictureSource::Bytes(vec![0]),
            CellAddress::new(2, 0),
        ));

        ws.insert_rows(1, 2).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("header"));
        assert_eq!(ws.get_value("A2").unwrap(), CellValue::Empty);
        assert_eq!(ws.get_value("A4").unwrap().as_string(), Some("row"));
        assert_eq!(ws.get_value("B5").unwrap().as_string(), Some("footer"));
        assert_eq!(ws.pictures()[0].anchor, CellAddress::new(4, 0));
        assert_eq!(ws.max_row(), Some(4));
    }

    #[test]
    fn test_style_and_visibility() {
        let mut ws = Worksheet::new("Sheet1");
        assert!(ws.is_visible());
        ws.set_visible(false);
        assert!(!ws.is_visible());

        let style = Style::new().bold(true);
        ws.set_cell_style("A1", &style).unwrap();
        assert!(ws.cell_style("A1").unwrap().unwrap().font.bold);
        assert!(ws.cell_style_at(5, 5).is_none());
    }
}
