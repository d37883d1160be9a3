//! Initial canvas load.
//!
//! The fetch-by-id endpoint returns the grid size and every non-background
//! pixel:
//!
//! ```json
//! { "width": 64, "height": 64, "pixels": [{ "x": 3, "y": 4, "color": "#ff0000" }] }
//! ```
//!
//! Rasterizing fills a fresh bitmap with the background first. Any
//! inconsistency (zero or oversized grid, pixel outside it) fails the whole
//! load; a partially drawn canvas is never shown.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Cell, GridSize};
use crate::color::Color;
use crate::consts::MAX_GRID_DIM;
use crate::error::CanvasError;
use crate::raster::Bitmap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPixel {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pixels: Vec<SnapshotPixel>,
}

impl CanvasSnapshot {
    /// Parse a snapshot response body.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Snapshot`] if the body is not a snapshot.
    pub fn from_json(raw: &str) -> Result<Self, CanvasError> {
        serde_json::from_str(raw).map_err(|e| CanvasError::Snapshot(e.to_string()))
    }

    /// The grid this snapshot describes.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Snapshot`] for an empty grid or one larger than
    /// [`MAX_GRID_DIM`] on either axis.
    pub fn grid(&self) -> Result<GridSize, CanvasError> {
        let ok = |d: u32| (1..=MAX_GRID_DIM).contains(&d);
        if !ok(self.width) || !ok(self.height) {
            return Err(CanvasError::Snapshot(format!("unsupported grid size {}x{}", self.width, self.height)));
        }
        Ok(GridSize::new(self.width, self.height))
    }

    /// Draw every pixel onto a bitmap filled with `background`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Snapshot`] for an invalid grid or a pixel
    /// outside it.
    pub fn rasterize(&self, background: Color) -> Result<Bitmap, CanvasError> {
        let grid = self.grid()?;
        let mut bitmap = Bitmap::new(grid, background);
        for px in &self.pixels {
            let cell = Cell::new(px.x, px.y);
            if !grid.contains(cell) {
                return Err(CanvasError::Snapshot(format!("pixel ({}, {}) outside {}x{} grid", px.x, px.y, grid.width, grid.height)));
            }
            bitmap.paint_cell(cell, px.color);
        }
        Ok(bitmap)
    }
}
