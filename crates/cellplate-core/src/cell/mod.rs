//! Cell-related types
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellData`] - Complete cell data including value, style and hyperlink
//! - [`CellMut`] - A mutable handle on one cell of a worksheet

mod address;
mod data;
mod handle;
mod value;

pub use address::CellAddress;
pub use data::CellData;
pub use handle::CellMut;
pub use value::{CellError, CellValue, SharedString};
