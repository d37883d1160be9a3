//! Rendering: composites the layer stack into the visible canvas.
//!
//! Drawing is split in two. [`build`] turns read-only engine state into a
//! [`DisplayList`] of plain [`DrawCmd`]s; it is pure and runs (and is
//! tested) natively. [`replay`] is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`].
//!
//! Per frame, in order:
//!
//! 1. clear
//! 2. content layer under the view transform (background and bitmap)
//! 3. rotating gradient border around the grid
//! 4. grid lines (edit-capable views, zoomed in far enough)
//! 5. preview layer (pending outline, preview pixel, blinking flags)
//! 6. overlay layer (image at its transparency, handles while unfixed)
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::TAU;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, ImageData};

use crate::camera::{Cell, Point, Viewport};
use crate::color::Color;
use crate::config::EngineConfig;
use crate::consts::BORDER_WIDTH_PX;
use crate::overlay::{Handle, OverlayImage};
use crate::raster::{LayerStack, blink_visible};

/// Outline width for the pending selection, in screen pixels.
const SELECTION_WIDTH_PX: f64 = 2.0;
/// Outline for a pending selection with no colour picked yet.
const SELECTION_UNSET: Color = Color::rgba(0, 0, 0, 200);
const FLAG_COLOR: Color = Color::rgb(0xff, 0xd6, 0x00);
const HANDLE_FILL: Color = Color::rgb(0xfa, 0xfb, 0xff);
const HANDLE_STROKE: Color = Color::rgb(0x33, 0x66, 0xff);

/// Which backing raster an image command draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Bitmap,
    Overlay,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// One drawing instruction. Coordinates are CSS pixels unless inside a
/// `PushView`/`PopView` pair, where they are world units.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear { w: f64, h: f64 },
    PushView(Viewport),
    PopView,
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color, width: f64 },
    /// Nearest-neighbour image blit.
    Image { source: ImageSource, rect: Rect, alpha: f64 },
    /// Vertical and horizontal hairlines at the given screen positions.
    GridLines { xs: Vec<f64>, ys: Vec<f64>, bounds: Rect, color: Color },
    /// Rect stroked with a linear gradient rotated to `angle` radians.
    GradientBorder { rect: Rect, angle: f64, stops: Vec<Color>, width: f64 },
}

/// An ordered list of draw commands for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<DrawCmd>,
}

impl DisplayList {
    fn push(&mut self, cmd: DrawCmd) {
        self.commands.push(cmd);
    }
}

/// Read-only view of everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub layers: &'a LayerStack,
    pub viewport: &'a Viewport,
    pub config: &'a EngineConfig,
    pub viewport_w: f64,
    pub viewport_h: f64,
    /// Grid lines are only drawn when editing is possible.
    pub editable: bool,
    pub now_ms: f64,
}

/// Build the display list for one frame.
#[must_use]
pub fn build(scene: &Scene<'_>) -> DisplayList {
    let mut list = DisplayList::default();
    let grid = scene.layers.grid();
    let (gw, gh) = (f64::from(grid.width), f64::from(grid.height));

    list.push(DrawCmd::Clear { w: scene.viewport_w, h: scene.viewport_h });

    // Content layer, world units.
    list.push(DrawCmd::PushView(*scene.viewport));
    list.push(DrawCmd::FillRect { rect: Rect::new(0.0, 0.0, gw, gh), color: scene.config.background });
    list.push(DrawCmd::Image { source: ImageSource::Bitmap, rect: Rect::new(0.0, 0.0, gw, gh), alpha: 1.0 });
    list.push(DrawCmd::PopView);

    let grid_rect = screen_rect(scene.viewport, Point::new(0.0, 0.0), gw, gh);
    list.push(DrawCmd::GradientBorder {
        rect: grid_rect,
        angle: border_angle(scene.now_ms, scene.config.border_period_ms),
        stops: scene.config.border_stops.clone(),
        width: BORDER_WIDTH_PX,
    });

    if scene.editable && scene.viewport.scale >= scene.config.grid_min_scale {
        push_grid_lines(&mut list, scene, grid_rect);
    }

    push_preview(&mut list, scene);

    if let Some(overlay) = &scene.layers.overlay {
        push_overlay(&mut list, scene, overlay);
    }
    list
}

/// Rotation of the decorative border gradient at `now_ms`.
#[must_use]
pub fn border_angle(now_ms: f64, period_ms: f64) -> f64 {
    if period_ms <= 0.0 {
        return 0.0;
    }
    now_ms.rem_euclid(period_ms) / period_ms * TAU
}

fn screen_rect(viewport: &Viewport, world: Point, w: f64, h: f64) -> Rect {
    let p = viewport.world_to_screen(world);
    Rect::new(p.x, p.y, w * viewport.scale, h * viewport.scale)
}

fn cell_rect(viewport: &Viewport, cell: Cell) -> Rect {
    let p = viewport.cell_to_screen(cell);
    Rect::new(p.x, p.y, viewport.scale, viewport.scale)
}

/// Lines for the visible part of the grid only.
fn push_grid_lines(list: &mut DisplayList, scene: &Scene<'_>, grid_rect: Rect) {
    let vp = scene.viewport;
    let grid = scene.layers.grid();
    let visible = |offset: f64, extent: f64, cells: u32| {
        let first = (-offset / vp.scale).floor().max(0.0) as u32;
        let last = ((extent - offset) / vp.scale).ceil().clamp(0.0, f64::from(cells)) as u32;
        (first..=last).map(move |i| offset + f64::from(i) * vp.scale)
    };
    let xs: Vec<f64> = visible(vp.offset_x, scene.viewport_w, grid.width).collect();
    let ys: Vec<f64> = visible(vp.offset_y, scene.viewport_h, grid.height).collect();
    if xs.is_empty() && ys.is_empty() {
        return;
    }
    list.push(DrawCmd::GridLines { xs, ys, bounds: grid_rect, color: scene.config.grid_line_color });
}

fn push_preview(list: &mut DisplayList, scene: &Scene<'_>) {
    let vp = scene.viewport;
    let preview = &scene.layers.preview;

    if let Some(px) = preview.preview {
        list.push(DrawCmd::FillRect { rect: cell_rect(vp, px.cell), color: px.color });
    }
    if blink_visible(scene.now_ms, scene.config.blink_period_ms) {
        for flag in &preview.flagged {
            list.push(DrawCmd::StrokeRect { rect: cell_rect(vp, flag.cell), color: FLAG_COLOR, width: SELECTION_WIDTH_PX });
        }
    }
    if let Some(pending) = preview.pending {
        list.push(DrawCmd::StrokeRect {
            rect: cell_rect(vp, pending.cell),
            color: pending.color.unwrap_or(SELECTION_UNSET),
            width: SELECTION_WIDTH_PX,
        });
    }
}

fn push_overlay(list: &mut DisplayList, scene: &Scene<'_>, overlay: &OverlayImage) {
    let vp = scene.viewport;
    list.push(DrawCmd::Image {
        source: ImageSource::Overlay,
        rect: screen_rect(vp, overlay.position, overlay.size.w, overlay.size.h),
        alpha: overlay.transparency,
    });
    if overlay.fixed {
        return;
    }
    list.push(DrawCmd::StrokeRect {
        rect: screen_rect(vp, overlay.position, overlay.size.w, overlay.size.h),
        color: HANDLE_STROKE,
        width: 1.0,
    });
    let size = scene.config.handle_size_px;
    for handle in Handle::ALL {
        let c = vp.world_to_screen(overlay.handle_point(handle));
        let rect = Rect::new(c.x - size * 0.5, c.y - size * 0.5, size, size);
        list.push(DrawCmd::FillRect { rect, color: HANDLE_FILL });
        list.push(DrawCmd::StrokeRect { rect, color: HANDLE_STROKE, width: 1.0 });
    }
}

// =============================================================
// Canvas2D replay
// =============================================================

/// An offscreen canvas holding one uploaded raster.
struct Backing {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    key: Option<u64>,
}

/// Offscreen canvases for the bitmap and overlay, re-uploaded only when
/// their contents change.
pub struct Surfaces {
    document: Document,
    bitmap: Option<Backing>,
    overlay: Option<Backing>,
}

impl Surfaces {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document, bitmap: None, overlay: None }
    }

    /// Bring the backing rasters up to date with `layers`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if an offscreen canvas cannot be created or written.
    pub fn sync(&mut self, layers: &LayerStack) -> Result<(), JsValue> {
        let grid = layers.grid();
        let bitmap = &layers.bitmap;
        upload(&self.document, &mut self.bitmap, bitmap.version(), grid.width, grid.height, bitmap.as_rgba())?;
        match &layers.overlay {
            Some(o) => upload(&self.document, &mut self.overlay, o.serial, o.image.width(), o.image.height(), o.image.as_raw())?,
            None => self.overlay = None,
        }
        Ok(())
    }

    fn canvas(&self, source: ImageSource) -> Option<&HtmlCanvasElement> {
        match source {
            ImageSource::Bitmap => self.bitmap.as_ref().map(|b| &b.canvas),
            ImageSource::Overlay => self.overlay.as_ref().map(|b| &b.canvas),
        }
    }
}

fn upload(document: &Document, slot: &mut Option<Backing>, key: u64, w: u32, h: u32, rgba: &[u8]) -> Result<(), JsValue> {
    let stale = slot
        .as_ref()
        .is_none_or(|b| b.key != Some(key) || b.canvas.width() != w || b.canvas.height() != h);
    if !stale {
        return Ok(());
    }
    if slot.as_ref().is_none_or(|b| b.canvas.width() != w || b.canvas.height() != h) {
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_width(w);
        canvas.set_height(h);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        *slot = Some(Backing { canvas, ctx, key: None });
    }
    if let Some(backing) = slot.as_mut() {
        let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(rgba), w, h)?;
        backing.ctx.put_image_data(&data, 0.0, 0.0)?;
        backing.key = Some(key);
    }
    Ok(())
}

/// Draw `list` onto `ctx`. The device-pixel-ratio transform set at resize
/// time is the base every command draws on top of.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn replay(ctx: &CanvasRenderingContext2d, list: &DisplayList, surfaces: &Surfaces) -> Result<(), JsValue> {
    ctx.set_image_smoothing_enabled(false);
    for cmd in &list.commands {
        match cmd {
            DrawCmd::Clear { w, h } => ctx.clear_rect(0.0, 0.0, *w, *h),
            DrawCmd::PushView(vp) => {
                ctx.save();
                ctx.translate(vp.offset_x, vp.offset_y)?;
                ctx.scale(vp.scale, vp.scale)?;
            }
            DrawCmd::PopView => ctx.restore(),
            DrawCmd::FillRect { rect, color } => {
                ctx.set_fill_style_str(&color.to_css());
                ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
            }
            DrawCmd::StrokeRect { rect, color, width } => {
                ctx.set_stroke_style_str(&color.to_css());
                ctx.set_line_width(*width);
                ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
            }
            DrawCmd::Image { source, rect, alpha } => {
                if let Some(canvas) = surfaces.canvas(*source) {
                    ctx.save();
                    ctx.set_global_alpha(*alpha);
                    ctx.draw_image_with_html_canvas_element_and_dw_and_dh(canvas, rect.x, rect.y, rect.w, rect.h)?;
                    ctx.restore();
                }
            }
            DrawCmd::GridLines { xs, ys, bounds, color } => draw_grid_lines(ctx, xs, ys, *bounds, *color),
            DrawCmd::GradientBorder { rect, angle, stops, width } => draw_border(ctx, *rect, *angle, stops, *width)?,
        }
    }
    Ok(())
}

fn draw_grid_lines(ctx: &CanvasRenderingContext2d, xs: &[f64], ys: &[f64], bounds: Rect, color: Color) {
    ctx.set_stroke_style_str(&color.to_css());
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for x in xs {
        // Half-pixel offset keeps hairlines crisp.
        let x = x.round() + 0.5;
        ctx.move_to(x, bounds.y);
        ctx.line_to(x, bounds.y + bounds.h);
    }
    for y in ys {
        let y = y.round() + 0.5;
        ctx.move_to(bounds.x, y);
        ctx.line_to(bounds.x + bounds.w, y);
    }
    ctx.stroke();
}

fn draw_border(ctx: &CanvasRenderingContext2d, rect: Rect, angle: f64, stops: &[Color], width: f64) -> Result<(), JsValue> {
    let (cx, cy) = (rect.x + rect.w * 0.5, rect.y + rect.h * 0.5);
    let r = rect.w.hypot(rect.h) * 0.5;
    let (dx, dy) = (angle.cos() * r, angle.sin() * r);
    let gradient = ctx.create_linear_gradient(cx - dx, cy - dy, cx + dx, cy + dy);
    let last = stops.len().saturating_sub(1).max(1) as f32;
    for (i, stop) in stops.iter().enumerate() {
        gradient.add_color_stop(i as f32 / last, &stop.to_css())?;
    }
    ctx.set_stroke_style_canvas_gradient(&gradient);
    ctx.set_line_width(width);
    let half = width * 0.5;
    ctx.stroke_rect(rect.x - half, rect.y - half, rect.w + width, rect.h + width);
    Ok(())
}
