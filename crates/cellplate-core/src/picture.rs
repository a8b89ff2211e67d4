//! Pictures anchored to cells

use crate::cell::CellAddress;
use std::path::PathBuf;

/// Where a picture's image data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureSource {
    /// Raw image bytes
    Bytes(Vec<u8>),
    /// Image file on disk
    Path(PathBuf),
}

/// A picture placed over a worksheet, anchored at a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// Image data
    pub source: PictureSource,
    /// Top-left anchor cell
    pub anchor: CellAddress,
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
    /// Scale factor (1.0 = original size)
    pub scale: Option<f64>,
}

impl Picture {
    /// Create a picture anchored at `anchor` with no explicit size
    pub fn new(source: PictureSource, anchor: CellAddress) -> Self {
        Self {
            source,
            anchor,
            width: None,
            height: None,
            scale: None,
        }
    }

    /// Set the width in pixels
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the height in pixels
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the scale factor
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }
}
