//! Overlay image tool: a reference picture layered above the bitmap for tracing.
//!
//! The overlay lives in world coordinates (fractional, unclamped to the grid)
//! and is only ever composited at render time. It never writes into the
//! [`crate::raster::Bitmap`].

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use image::RgbaImage;

use crate::camera::{GridSize, Point};
use crate::error::CanvasError;

/// Resize handles. `Se` moves both axes, `E` and `S` one each; the opposite
/// corner (the overlay's top-left) stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Se,
    E,
    S,
}

impl Handle {
    pub const ALL: [Self; 3] = [Self::Se, Self::E, Self::S];

    /// CSS cursor shown while hovering or dragging this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Se => "nwse-resize",
            Self::E => "ew-resize",
            Self::S => "ns-resize",
        }
    }
}

/// Overlay width and height in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

/// Size bounds for an overlay on one grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLimits {
    pub min: f64,
    pub max_w: f64,
    pub max_h: f64,
}

impl OverlayLimits {
    /// `min` world units per side, at most `max_multiple` times the grid.
    #[must_use]
    pub fn for_grid(grid: GridSize, min: f64, max_multiple: f64) -> Self {
        Self {
            min,
            max_w: (f64::from(grid.width) * max_multiple).max(min),
            max_h: (f64::from(grid.height) * max_multiple).max(min),
        }
    }

    fn clamp_w(&self, w: f64) -> f64 {
        w.clamp(self.min, self.max_w)
    }

    fn clamp_h(&self, h: f64) -> f64 {
        h.clamp(self.min, self.max_h)
    }
}

/// An attached reference image.
#[derive(Debug, Clone)]
pub struct OverlayImage {
    pub image: RgbaImage,
    /// World-space top-left corner.
    pub position: Point,
    pub size: Size,
    /// Alpha applied when compositing, in `[0, 1]`.
    pub transparency: f64,
    /// Once fixed the overlay can no longer be moved or resized.
    pub fixed: bool,
    /// Distinguishes successive attachments for surface caching.
    pub serial: u64,
    limits: OverlayLimits,
}

impl OverlayImage {
    /// Place `image` centred on `grid`, fitted within `fit_fraction` of it
    /// and scaled uniformly so the aspect ratio is preserved.
    #[must_use]
    pub fn attach(image: RgbaImage, grid: GridSize, fit_fraction: f64, limits: OverlayLimits) -> Self {
        let (iw, ih) = (f64::from(image.width().max(1)), f64::from(image.height().max(1)));
        let (gw, gh) = (f64::from(grid.width), f64::from(grid.height));

        // One uniform factor. When an extreme aspect ratio cannot meet both
        // bounds, the minimum side length wins.
        let fit = (gw * fit_fraction / iw).min(gh * fit_fraction / ih);
        let k_max = (limits.max_w / iw).min(limits.max_h / ih);
        let k_min = limits.min / iw.min(ih);
        let k = fit.min(k_max).max(k_min);
        let size = Size { w: iw * k, h: ih * k };
        let position = Point::new((gw - size.w) * 0.5, (gh - size.h) * 0.5);

        Self { image, position, size, transparency: 0.5, fixed: false, serial: 0, limits }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.position.x + self.size.w * 0.5, self.position.y + self.size.h * 0.5)
    }

    #[must_use]
    pub fn contains(&self, world: Point) -> bool {
        world.x >= self.position.x
            && world.x <= self.position.x + self.size.w
            && world.y >= self.position.y
            && world.y <= self.position.y + self.size.h
    }

    /// World-space anchor of `handle`.
    #[must_use]
    pub fn handle_point(&self, handle: Handle) -> Point {
        let (x, y) = (self.position.x, self.position.y);
        let Size { w, h } = self.size;
        match handle {
            Handle::Se => Point::new(x + w, y + h),
            Handle::E => Point::new(x + w, y + h * 0.5),
            Handle::S => Point::new(x + w * 0.5, y + h),
        }
    }

    /// Translate by a world-space delta. Not clamped to the grid.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> bool {
        if self.fixed {
            return false;
        }
        self.position.x += dx;
        self.position.y += dy;
        true
    }

    /// Drag `handle` to `world`, keeping the top-left corner fixed.
    pub fn resize(&mut self, handle: Handle, world: Point) -> bool {
        if self.fixed {
            return false;
        }
        let w = self.limits.clamp_w(world.x - self.position.x);
        let h = self.limits.clamp_h(world.y - self.position.y);
        match handle {
            Handle::Se => self.size = Size { w, h },
            Handle::E => self.size.w = w,
            Handle::S => self.size.h = h,
        }
        true
    }

    /// Scale both sides by `factor` about the centre. The factor is limited so
    /// neither side leaves the size bounds; returns `false` if nothing changed.
    pub fn scale_about_center(&mut self, factor: f64) -> bool {
        if self.fixed || !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let Size { w, h } = self.size;
        let lo = (self.limits.min / w).max(self.limits.min / h);
        let hi = (self.limits.max_w / w).min(self.limits.max_h / h);
        if lo > hi {
            return false;
        }
        let k = factor.clamp(lo, hi);
        if (k - 1.0).abs() < f64::EPSILON {
            return false;
        }
        let c = self.center();
        self.size = Size { w: w * k, h: h * k };
        self.position = Point::new(c.x - self.size.w * 0.5, c.y - self.size.h * 0.5);
        true
    }

    /// Set compositing alpha, clamped to `[0, 1]`. Allowed after fixing.
    pub fn set_transparency(&mut self, value: f64) -> bool {
        let v = if value.is_nan() { self.transparency } else { value.clamp(0.0, 1.0) };
        let changed = (v - self.transparency).abs() > f64::EPSILON;
        self.transparency = v;
        changed
    }

    /// Lock position and size and hide the handles.
    pub fn confirm(&mut self) {
        self.fixed = true;
    }
}

/// Decode PNG or JPEG bytes into an RGBA raster.
///
/// # Errors
///
/// Returns [`CanvasError::Image`] if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, CanvasError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
