//! Viewport transform: screen ↔ world mapping, anchored zoom, pan and fit.
//!
//! World space is measured in cells: cell `(x, y)` covers
//! `[x, x + 1) × [y, y + 1)`. Screen space is CSS pixels. The mapping is
//! `screen = world * scale + offset`.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// One addressable grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    #[must_use]
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(f64::from(self.x) + 0.5, f64::from(self.y) + 0.5)
    }
}

/// Fixed grid bounds for a loaded canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn contains(self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// The cell containing a world point, or `None` outside the grid.
    #[must_use]
    pub fn cell_at(self, world: Point) -> Option<Cell> {
        let (fx, fy) = (world.x.floor(), world.y.floor());
        if fx < 0.0 || fy < 0.0 || fx >= f64::from(self.width) || fy >= f64::from(self.height) {
            return None;
        }
        Some(Cell::new(fx as u32, fy as u32))
    }

    /// Move `cell` by `(dx, dy)`, clamped to the grid.
    #[must_use]
    pub fn nudge(self, cell: Cell, dx: i64, dy: i64) -> Cell {
        let max_x = i64::from(self.width.saturating_sub(1));
        let max_y = i64::from(self.height.saturating_sub(1));
        let x = (i64::from(cell.x) + dx).clamp(0, max_x);
        let y = (i64::from(cell.y) + dy).clamp(0, max_y);
        Cell::new(x as u32, y as u32)
    }
}

/// Scale and screen-space offset of the canvas view.
///
/// `scale` is screen pixels per cell and always lies in the configured
/// `[min, max]` range once the viewport has been through [`Viewport::zoom_at`]
/// or [`Viewport::reset_and_center`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset_x) / self.scale,
            y: (screen.y - self.offset_y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.offset_x,
            y: world.y * self.scale + self.offset_y,
        }
    }

    /// Top-left screen corner of `cell`.
    #[must_use]
    pub fn cell_to_screen(&self, cell: Cell) -> Point {
        self.world_to_screen(Point::new(f64::from(cell.x), f64::from(cell.y)))
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Multiply the scale by `factor`, keeping the world point under `anchor`
    /// fixed on screen. Returns `false` when clamping leaves the scale unchanged.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64, min_scale: f64, max_scale: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let next = (self.scale * factor).clamp(min_scale, max_scale);
        if (next - self.scale).abs() < f64::EPSILON {
            return false;
        }
        let world = self.screen_to_world(anchor);
        self.scale = next;
        self.offset_x = anchor.x - world.x * next;
        self.offset_y = anchor.y - world.y * next;
        true
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Offset that puts the centre of `cell` at the centre of the viewport.
    #[must_use]
    pub fn offset_centering(&self, cell: Cell, viewport_w: f64, viewport_h: f64) -> Point {
        let c = cell.center();
        Point::new(viewport_w * 0.5 - c.x * self.scale, viewport_h * 0.5 - c.y * self.scale)
    }

    /// Scale that fits `grid` into the viewport, before clamping.
    #[must_use]
    pub fn fit_scale(viewport_w: f64, viewport_h: f64, grid: GridSize, fit_factor: f64) -> f64 {
        let gw = f64::from(grid.width.max(1));
        let gh = f64::from(grid.height.max(1));
        (viewport_w / gw).min(viewport_h / gh) * fit_factor
    }

    /// Fit the grid into the viewport (clamped) and centre it.
    pub fn reset_and_center(
        &mut self,
        viewport_w: f64,
        viewport_h: f64,
        grid: GridSize,
        fit_factor: f64,
        min_scale: f64,
        max_scale: f64,
    ) {
        self.scale = Self::fit_scale(viewport_w, viewport_h, grid, fit_factor).clamp(min_scale, max_scale);
        self.offset_x = (viewport_w - f64::from(grid.width) * self.scale) * 0.5;
        self.offset_y = (viewport_h - f64::from(grid.height) * self.scale) * 0.5;
    }
}
