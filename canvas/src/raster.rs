//! Layered raster model.
//!
//! Three layers are composited in order by [`crate::render`]:
//!
//! 1. **Content**: the authoritative [`Bitmap`], one RGBA value per cell.
//! 2. **Preview**: the pending selection outline, the optimistic preview
//!    pixel and blinking flagged cells ([`PreviewLayer`]).
//! 3. **Overlay**: an optional tracing image ([`crate::overlay::OverlayImage`]).
//!
//! Only the bitmap is authoritative. Preview and overlay state live in their
//! own stores and never write into it.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use image::RgbaImage;

use crate::camera::{Cell, GridSize};
use crate::color::Color;
use crate::overlay::OverlayImage;

/// Per-cell colour raster for a loaded canvas.
#[derive(Debug, Clone)]
pub struct Bitmap {
    grid: GridSize,
    image: RgbaImage,
    version: u64,
}

impl Bitmap {
    /// A bitmap of `grid` cells, every one set to `fill`.
    #[must_use]
    pub fn new(grid: GridSize, fill: Color) -> Self {
        Self { grid, image: RgbaImage::from_pixel(grid.width, grid.height, fill.into()), version: 0 }
    }

    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Set one cell. Returns `true` if the stored colour changed; repainting
    /// the same colour and out-of-bounds cells are no-ops.
    pub fn paint_cell(&mut self, cell: Cell, color: Color) -> bool {
        if !self.grid.contains(cell) {
            return false;
        }
        let px: image::Rgba<u8> = color.into();
        if *self.image.get_pixel(cell.x, cell.y) == px {
            return false;
        }
        self.image.put_pixel(cell.x, cell.y, px);
        self.version = self.version.wrapping_add(1);
        true
    }

    /// Colour of `cell`, or `None` outside the grid.
    #[must_use]
    pub fn read_cell(&self, cell: Cell) -> Option<Color> {
        self.image.get_pixel_checked(cell.x, cell.y).map(|px| Color::from(*px))
    }

    /// Bumped on every effective write; lets surfaces skip re-uploads.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Row-major RGBA bytes, four per cell.
    #[must_use]
    pub fn as_rgba(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// A copy of the raster as an `image` buffer (for export).
    #[must_use]
    pub fn to_image(&self) -> RgbaImage {
        self.image.clone()
    }
}

/// The cell a user clicked but has not confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSelection {
    pub cell: Cell,
    /// `None` until a palette colour is picked.
    pub color: Option<Color>,
}

/// Optimistic highlight for a just-confirmed edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewPixel {
    pub cell: Cell,
    pub color: Color,
    pub expires_at_ms: f64,
}

/// A cell highlighted by a time-based blink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlaggedCell {
    pub cell: Cell,
    pub until_ms: f64,
}

/// Whether a blink with half-period `period_ms` is in its visible phase.
///
/// Depends only on the clock, never on frame count.
#[must_use]
pub fn blink_visible(now_ms: f64, period_ms: f64) -> bool {
    if period_ms <= 0.0 {
        return true;
    }
    ((now_ms / period_ms).floor() as i64).rem_euclid(2) == 0
}

/// Transient highlights drawn above the bitmap.
#[derive(Debug, Clone, Default)]
pub struct PreviewLayer {
    pub pending: Option<PendingSelection>,
    pub preview: Option<PreviewPixel>,
    pub flagged: Vec<FlaggedCell>,
}

impl PreviewLayer {
    /// Blink `cells` until `until_ms`, refreshing cells already flagged.
    pub fn flag(&mut self, cells: impl IntoIterator<Item = Cell>, until_ms: f64) {
        for cell in cells {
            match self.flagged.iter_mut().find(|f| f.cell == cell) {
                Some(existing) => existing.until_ms = existing.until_ms.max(until_ms),
                None => self.flagged.push(FlaggedCell { cell, until_ms }),
            }
        }
    }

    /// Drop an expired preview pixel and flags. Returns `true` if anything was removed.
    pub fn expire(&mut self, now_ms: f64) -> bool {
        let mut changed = false;
        if self.preview.is_some_and(|p| now_ms >= p.expires_at_ms) {
            self.preview = None;
            changed = true;
        }
        let before = self.flagged.len();
        self.flagged.retain(|f| now_ms < f.until_ms);
        changed || self.flagged.len() != before
    }

    /// A remote write to `cell` supersedes any local preview of it.
    pub fn supersede(&mut self, cell: Cell) -> bool {
        if self.preview.is_some_and(|p| p.cell == cell) {
            self.preview = None;
            return true;
        }
        false
    }

    /// Whether anything in this layer changes with time alone.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.preview.is_some() || !self.flagged.is_empty()
    }
}

/// The three layers of one canvas.
#[derive(Debug, Clone)]
pub struct LayerStack {
    pub bitmap: Bitmap,
    pub preview: PreviewLayer,
    pub overlay: Option<OverlayImage>,
}

impl LayerStack {
    #[must_use]
    pub fn new(grid: GridSize, background: Color) -> Self {
        Self { bitmap: Bitmap::new(grid, background), preview: PreviewLayer::default(), overlay: None }
    }

    #[must_use]
    pub fn grid(&self) -> GridSize {
        self.bitmap.grid()
    }

    pub fn paint_cell(&mut self, cell: Cell, color: Color) -> bool {
        self.bitmap.paint_cell(cell, color)
    }

    #[must_use]
    pub fn read_cell(&self, cell: Cell) -> Option<Color> {
        self.bitmap.read_cell(cell)
    }
}
