use image::RgbaImage;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::CenterAnimator;
use crate::camera::{Cell, GridSize, Point, Viewport};
use crate::color::Color;
use crate::config::EngineConfig;
use crate::error::CanvasError;
use crate::gesture::{GestureOutcome, InteractionContext};
use crate::hit::{self, OverlayHit};
use crate::input::{Button, Key, Modifiers, TouchPoint, WheelDelta};
use crate::overlay::{self, OverlayImage, OverlayLimits};
use crate::placement::{ChallengeView, CooldownState, Effect, Notice, Placement};
use crate::raster::{LayerStack, PendingSelection, PreviewLayer};
use crate::render::{self, DisplayList, Scene, Surfaces};
use crate::snapshot::CanvasSnapshot;
use crate::sync::{SyncEvent, SyncRequest};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const CURSOR_DEFAULT: &str = "default";
const CURSOR_CELL: &str = "crosshair";
const CURSOR_GRAB: &str = "grabbing";

/// Load lifecycle of the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CanvasStatus {
    #[default]
    Loading,
    Ready,
    /// Terminal until a new snapshot loads.
    Unavailable(String),
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hand to the sync transport.
    Submit(SyncRequest),
    /// Show a transient message.
    Notice(Notice),
    ChallengeOpened(ChallengeView),
    ChallengeClosed,
    CooldownChanged(CooldownState),
    /// The pending selection changed; `None` closes the palette.
    SelectionChanged(Option<PendingSelection>),
    StatusChanged(CanvasStatus),
    SetCursor(String),
    RenderNeeded,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
/// Every time-dependent entry point takes `now_ms` from a monotonic clock
/// (`performance.now()` in the browser).
pub struct EngineCore {
    pub config: EngineConfig,
    pub status: CanvasStatus,
    pub viewport: Viewport,
    pub layers: LayerStack,
    pub placement: Placement,
    pub gesture: InteractionContext,
    pub animator: CenterAnimator,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    editable: bool,
    overlay_edit: bool,
    external_focus: bool,
    overlay_serial: u64,
    cursor: &'static str,
}

impl EngineCore {
    /// `seed` drives challenge question choice.
    #[must_use]
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        Self {
            placement: Placement::new(&config, seed),
            gesture: InteractionContext::new(config.drag_threshold_px),
            layers: LayerStack::new(GridSize::new(0, 0), config.background),
            config,
            status: CanvasStatus::Loading,
            viewport: Viewport::default(),
            animator: CenterAnimator::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            editable: true,
            overlay_edit: false,
            external_focus: false,
            overlay_serial: 0,
            cursor: CURSOR_DEFAULT,
        }
    }

    // --- Data inputs ---

    /// Rasterize the initial snapshot onto a fresh bitmap and fit it to the
    /// viewport. A malformed snapshot leaves the canvas unavailable.
    pub fn load_snapshot(&mut self, snapshot: &CanvasSnapshot) -> Vec<Action> {
        match snapshot.rasterize(self.config.background) {
            Ok(bitmap) => {
                let grid = bitmap.grid();
                self.layers = LayerStack { bitmap, preview: PreviewLayer::default(), overlay: None };
                self.gesture.cancel();
                self.animator.stop();
                self.reset_view();
                self.status = CanvasStatus::Ready;
                tracing::info!(width = grid.width, height = grid.height, pixels = snapshot.pixels.len(), "canvas loaded");
                vec![Action::StatusChanged(CanvasStatus::Ready), Action::RenderNeeded]
            }
            Err(e) => self.load_failed(&e),
        }
    }

    /// The host could not fetch the snapshot.
    pub fn load_failed(&mut self, error: &CanvasError) -> Vec<Action> {
        tracing::warn!(%error, "canvas unavailable");
        self.status = CanvasStatus::Unavailable(error.to_string());
        vec![Action::StatusChanged(self.status.clone()), Action::RenderNeeded]
    }

    /// Apply an inbound realtime event. Remote pixels are applied even while
    /// the local user is cooling down.
    pub fn apply_sync_event(&mut self, event: SyncEvent, now_ms: f64) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            tracing::debug!(?event, "event before canvas ready");
            return Vec::new();
        }
        self.with_placement(now_ms, |p, layers| match event {
            SyncEvent::PixelUpdate { cell, color } => p.apply_remote_pixel(layers, cell, color),
            SyncEvent::CooldownNotice { active, remaining_seconds } => {
                p.apply_cooldown_notice(active, remaining_seconds, now_ms)
            }
            SyncEvent::EditRejected { message, remaining_seconds } => p.apply_rejection(message, remaining_seconds, now_ms),
            SyncEvent::PeerRemovedCells { cells, actor_name } => p.apply_peer_removed(layers, &cells, actor_name, now_ms),
        })
    }

    // --- Viewport ---

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    /// The first size after a load fits and centres the grid.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        let first = self.viewport_width <= 0.0 || self.viewport_height <= 0.0;
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
        if first {
            self.reset_view();
        }
        vec![Action::RenderNeeded]
    }

    /// Fit the grid to the viewport and centre it.
    pub fn reset_view(&mut self) {
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return;
        }
        let c = &self.config;
        self.viewport.reset_and_center(
            self.viewport_width,
            self.viewport_height,
            self.layers.grid(),
            c.fit_factor,
            c.min_scale,
            c.max_scale,
        );
    }

    /// Animate the view so `cell` ends up centred. A later call supersedes
    /// an animation still in flight.
    pub fn center_on(&mut self, cell: Cell, now_ms: f64) {
        let from = Point::new(self.viewport.offset_x, self.viewport.offset_y);
        let to = self.viewport.offset_centering(cell, self.viewport_width, self.viewport_height);
        self.animator.start(from, to, now_ms, self.config.center_duration_ms);
    }

    // --- Control surface for external UI ---

    /// Navigate to a cell (e.g. a coordinate clicked in chat).
    pub fn set_target_pixel(&mut self, cell: Cell, now_ms: f64) -> Vec<Action> {
        if self.status != CanvasStatus::Ready || !self.layers.grid().contains(cell) {
            return Vec::new();
        }
        self.center_on(cell, now_ms);
        vec![Action::RenderNeeded]
    }

    /// Open the palette on `cell` as if it had been clicked.
    pub fn select_cell(&mut self, cell: Cell, now_ms: f64) -> Vec<Action> {
        if !self.accepts_edits() {
            return Vec::new();
        }
        self.with_placement(now_ms, |p, layers| p.select(layers, cell))
    }

    pub fn set_palette_color(&mut self, color: Color) -> Vec<Action> {
        self.with_placement(0.0, |p, layers| p.choose_color(layers, color))
    }

    pub fn request_confirm(&mut self, now_ms: f64) -> Vec<Action> {
        if !self.accepts_edits() {
            return Vec::new();
        }
        self.with_placement(now_ms, |p, layers| p.confirm(layers, now_ms))
    }

    pub fn answer_challenge(&mut self, choice: usize, now_ms: f64) -> Vec<Action> {
        self.with_placement(now_ms, |p, layers| p.answer_challenge(layers, choice, now_ms))
    }

    pub fn cancel_selection(&mut self) -> Vec<Action> {
        self.with_placement(0.0, Placement::cancel_selection)
    }

    /// Attach a decoded reference image and enter overlay edit mode.
    pub fn attach_overlay_image(&mut self, image: RgbaImage) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let grid = self.layers.grid();
        let limits = OverlayLimits::for_grid(grid, crate::consts::OVERLAY_MIN_SIZE, self.config.overlay_max_grid_multiple);
        let mut overlay = OverlayImage::attach(image, grid, self.config.overlay_fit_fraction, limits);
        self.overlay_serial += 1;
        overlay.serial = self.overlay_serial;
        self.layers.overlay = Some(overlay);
        self.overlay_edit = true;
        vec![Action::RenderNeeded]
    }

    /// Decode PNG/JPEG bytes and attach them.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Image`] if the bytes cannot be decoded.
    pub fn attach_overlay_bytes(&mut self, bytes: &[u8]) -> Result<Vec<Action>, CanvasError> {
        let image = overlay::decode_image(bytes)?;
        Ok(self.attach_overlay_image(image))
    }

    pub fn set_overlay_transparency(&mut self, value: f64) -> Vec<Action> {
        let changed = self.layers.overlay.as_mut().is_some_and(|o| o.set_transparency(value));
        redraw_if(changed)
    }

    /// Lock the overlay in place and leave edit mode.
    pub fn confirm_overlay(&mut self) -> Vec<Action> {
        let Some(o) = self.layers.overlay.as_mut() else {
            return Vec::new();
        };
        o.confirm();
        self.overlay_edit = false;
        vec![Action::RenderNeeded]
    }

    /// Discard the overlay entirely.
    pub fn remove_overlay(&mut self) -> Vec<Action> {
        self.overlay_edit = false;
        if self.layers.overlay.take().is_some() { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// While on, wheel and drags over the unfixed overlay edit it.
    pub fn set_overlay_edit(&mut self, on: bool) {
        self.overlay_edit = on;
    }

    /// Spectator view: no selection and no grid lines; pan and zoom still work.
    pub fn set_editable(&mut self, editable: bool) -> Vec<Action> {
        self.editable = editable;
        let mut actions = if editable { Vec::new() } else { self.cancel_selection() };
        actions.push(Action::RenderNeeded);
        finish(actions)
    }

    /// An external text surface (chat) owns keyboard focus; Enter must not confirm.
    pub fn set_input_focus_external(&mut self, external: bool) {
        self.external_focus = external;
    }

    // --- Clock ---

    /// Advance animations and timers. Call once per animation frame while
    /// [`Self::needs_animation_frame`] is true, and at least once a second
    /// while [`Self::needs_tick`] is.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(frame) = self.animator.step(now_ms) {
            self.viewport.offset_x = frame.offset.x;
            self.viewport.offset_y = frame.offset.y;
            actions.push(Action::RenderNeeded);
        }
        actions.extend(self.with_placement(now_ms, |p, layers| p.tick(layers, now_ms)));
        if self.layers.preview.is_animating() || self.config.animated_border {
            actions.push(Action::RenderNeeded);
        }
        finish(actions)
    }

    /// Whether the host should keep a per-frame loop running. Otherwise
    /// redraws happen only on [`Action::RenderNeeded`].
    #[must_use]
    pub fn needs_animation_frame(&self) -> bool {
        self.animator.is_active()
            || self.layers.preview.is_animating()
            || self.placement.is_animating()
            || (self.config.animated_border && self.status == CanvasStatus::Ready)
    }

    /// Whether [`Self::tick`] still has work. A running cooldown only changes
    /// once a second, so a coarse interval timer is enough for it.
    #[must_use]
    pub fn needs_tick(&self, now_ms: f64) -> bool {
        self.needs_animation_frame() || self.placement.cooldown(now_ms).active
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let claim = self.overlay_claim(screen_pt);
        self.gesture.pointer_down(screen_pt, button, claim, &self.viewport);
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        if self.gesture.is_idle() {
            let cursor = match self.overlay_claim(screen_pt) {
                Some(part) => part.cursor(),
                None if self.editable && self.cell_at(screen_pt).is_some() => CURSOR_CELL,
                None => CURSOR_DEFAULT,
            };
            return self.set_cursor(cursor);
        }
        let outcome = self.gesture.pointer_move(screen_pt, &self.viewport);
        let mut actions = self.apply_outcome(outcome, 0.0);
        if matches!(outcome, GestureOutcome::Pan { .. }) {
            actions.extend(self.set_cursor(CURSOR_GRAB));
        }
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let outcome = self.gesture.pointer_up(screen_pt, &self.viewport);
        let mut actions = self.apply_outcome(outcome, now_ms);
        if self.cursor == CURSOR_GRAB {
            actions.extend(self.set_cursor(CURSOR_DEFAULT));
        }
        actions
    }

    /// Wheel zooms at the cursor, or scales the overlay about its centre
    /// while an unfixed overlay is being edited.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let factor = delta.zoom_factor(self.config.wheel_zoom_step);
        if self.overlay_edit {
            if let Some(o) = self.layers.overlay.as_mut().filter(|o| !o.fixed) {
                return if o.scale_about_center(factor) { vec![Action::RenderNeeded] } else { Vec::new() };
            }
        }
        self.apply_outcome(GestureOutcome::Zoom { anchor: screen_pt, factor }, 0.0)
    }

    pub fn on_touch_start(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let claim = match touches {
            [only] => self.overlay_claim(only.pos),
            _ => None,
        };
        let outcome = self.gesture.touch_start(touches, claim, &self.viewport);
        self.apply_outcome(outcome, 0.0)
    }

    pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let outcome = self.gesture.touch_move(touches, &self.viewport);
        self.apply_outcome(outcome, 0.0)
    }

    /// `remaining` are the touches still down; `released` is where the lifted finger was.
    pub fn on_touch_end(&mut self, remaining: &[TouchPoint], released: Point, now_ms: f64) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        let outcome = self.gesture.touch_end(remaining, released, &self.viewport);
        self.apply_outcome(outcome, now_ms)
    }

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        if self.status != CanvasStatus::Ready {
            return Vec::new();
        }
        if key.is_escape() {
            return self.escape();
        }
        if self.external_focus {
            return Vec::new();
        }
        if let Some((dx, dy)) = key.arrow_delta() {
            return self.with_placement(now_ms, |p, layers| p.nudge(layers, dx, dy));
        }
        if key.is_enter() {
            // Suppressed here so a cooling confirm never reaches the protocol.
            if self.placement.cooldown(now_ms).active {
                return Vec::new();
            }
            return self.request_confirm(now_ms);
        }
        Vec::new()
    }

    fn escape(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.gesture.is_idle() {
            self.gesture.cancel();
        }
        if self.overlay_edit {
            self.overlay_edit = false;
            actions.push(Action::RenderNeeded);
        }
        actions.extend(self.with_placement(0.0, Placement::cancel_selection));
        finish(actions)
    }

    // --- Queries ---

    #[must_use]
    pub fn status(&self) -> &CanvasStatus {
        &self.status
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    #[must_use]
    pub fn is_overlay_edit(&self) -> bool {
        self.overlay_edit
    }

    #[must_use]
    pub fn cooldown(&self, now_ms: f64) -> CooldownState {
        self.placement.cooldown(now_ms)
    }

    #[must_use]
    pub fn challenge(&self, now_ms: f64) -> Option<ChallengeView> {
        self.placement.challenge(now_ms)
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<PendingSelection> {
        self.layers.preview.pending
    }

    #[must_use]
    pub fn read_cell(&self, cell: Cell) -> Option<Color> {
        self.layers.read_cell(cell)
    }

    /// The cell under a screen point, if inside the grid.
    #[must_use]
    pub fn cell_at(&self, screen_pt: Point) -> Option<Cell> {
        self.layers.grid().cell_at(self.viewport.screen_to_world(screen_pt))
    }

    /// Build this frame's draw commands.
    #[must_use]
    pub fn display_list(&self, now_ms: f64) -> DisplayList {
        render::build(&Scene {
            layers: &self.layers,
            viewport: &self.viewport,
            config: &self.config,
            viewport_w: self.viewport_width,
            viewport_h: self.viewport_height,
            editable: self.editable,
            now_ms,
        })
    }

    // --- Internals ---

    fn accepts_edits(&self) -> bool {
        self.status == CanvasStatus::Ready && self.editable
    }

    /// Overlay part under a screen point, if an unfixed overlay is being edited.
    fn overlay_claim(&self, screen_pt: Point) -> Option<OverlayHit> {
        if !self.overlay_edit {
            return None;
        }
        let overlay = self.layers.overlay.as_ref()?;
        let world = self.viewport.screen_to_world(screen_pt);
        hit::hit_overlay(world, overlay, &self.viewport, self.config.handle_size_px)
    }

    fn apply_outcome(&mut self, outcome: GestureOutcome, now_ms: f64) -> Vec<Action> {
        match outcome {
            GestureOutcome::None => Vec::new(),
            GestureOutcome::Pan { dx, dy } => {
                self.animator.stop();
                self.viewport.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            GestureOutcome::Zoom { anchor, factor } => {
                let (min, max) = (self.config.min_scale, self.config.max_scale);
                if self.viewport.zoom_at(anchor, factor, min, max) {
                    self.animator.stop();
                    vec![Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            GestureOutcome::Select(screen_pt) => match self.cell_at(screen_pt) {
                Some(cell) => self.select_cell(cell, now_ms),
                None => Vec::new(),
            },
            GestureOutcome::MoveOverlay { dx, dy } => {
                redraw_if(self.layers.overlay.as_mut().is_some_and(|o| o.move_by(dx, dy)))
            }
            GestureOutcome::ResizeOverlay { handle, world } => {
                redraw_if(self.layers.overlay.as_mut().is_some_and(|o| o.resize(handle, world)))
            }
        }
    }

    /// Run a placement step and translate its effects. Reports the pending
    /// selection whenever the step changed it.
    fn with_placement(
        &mut self,
        now_ms: f64,
        step: impl FnOnce(&mut Placement, &mut LayerStack) -> Vec<Effect>,
    ) -> Vec<Action> {
        let before = self.layers.preview.pending;
        let effects = step(&mut self.placement, &mut self.layers);
        let after = self.layers.preview.pending;
        let mut actions = Vec::with_capacity(effects.len() + 1);
        if before != after {
            actions.push(Action::SelectionChanged(after));
        }
        actions.extend(self.absorb(effects, now_ms));
        actions
    }

    /// Turn protocol effects into host actions.
    fn absorb(&mut self, effects: Vec<Effect>, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::CenterOn(cell) => {
                    self.center_on(cell, now_ms);
                    actions.push(Action::RenderNeeded);
                }
                Effect::Submit(request) => actions.push(Action::Submit(request)),
                Effect::ChallengeOpened(view) => actions.push(Action::ChallengeOpened(view)),
                Effect::ChallengeClosed => actions.push(Action::ChallengeClosed),
                Effect::CooldownChanged(state) => actions.push(Action::CooldownChanged(state)),
                Effect::Notice(notice) => actions.push(Action::Notice(notice)),
                Effect::Redraw => actions.push(Action::RenderNeeded),
            }
        }
        finish(actions)
    }

    fn set_cursor(&mut self, cursor: &'static str) -> Vec<Action> {
        if self.cursor == cursor {
            return Vec::new();
        }
        self.cursor = cursor;
        vec![Action::SetCursor(cursor.to_owned())]
    }
}

fn redraw_if(changed: bool) -> Vec<Action> {
    if changed { vec![Action::RenderNeeded] } else { Vec::new() }
}

/// Collapse repeated render requests into one, at the end.
fn finish(actions: Vec<Action>) -> Vec<Action> {
    let render = actions.contains(&Action::RenderNeeded);
    let mut out: Vec<Action> = actions.into_iter().filter(|a| *a != Action::RenderNeeded).collect();
    if render {
        out.push(Action::RenderNeeded);
    }
    out
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    surfaces: Surfaces,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the element has no owning document or 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        let document = canvas.owner_document().ok_or_else(|| JsValue::from_str("canvas is detached"))?;
        let seed = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;
        Ok(Self { canvas, ctx, surfaces: Surfaces::new(document), core: EngineCore::new(config, seed) })
    }

    // --- Delegated data inputs ---

    pub fn load_snapshot(&mut self, snapshot: &CanvasSnapshot) -> Vec<Action> {
        self.core.load_snapshot(snapshot)
    }

    pub fn apply_sync_event(&mut self, event: SyncEvent, now_ms: f64) -> Vec<Action> {
        self.core.apply_sync_event(event, now_ms)
    }

    // --- Viewport ---

    /// Resize the backing store to `css * dpr` and apply the device-pixel-ratio
    /// transform once; frames draw in CSS pixels on top of it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the context rejects the transform.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Result<Vec<Action>, JsValue> {
        self.canvas.set_width((width_css * dpr).round() as u32);
        self.canvas.set_height((height_css * dpr).round() as u32);
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        Ok(self.core.set_viewport(width_css, height_css, dpr))
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers, now_ms)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_touch_start(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        self.core.on_touch_start(touches)
    }

    pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> Vec<Action> {
        self.core.on_touch_move(touches)
    }

    pub fn on_touch_end(&mut self, remaining: &[TouchPoint], released: Point, now_ms: f64) -> Vec<Action> {
        self.core.on_touch_end(remaining, released, now_ms)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        self.core.on_key_down(key, modifiers, now_ms)
    }

    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.tick(now_ms)
    }

    #[must_use]
    pub fn needs_animation_frame(&self) -> bool {
        self.core.needs_animation_frame()
    }

    #[must_use]
    pub fn needs_tick(&self, now_ms: f64) -> bool {
        self.core.needs_tick(now_ms)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&mut self, now_ms: f64) -> Result<(), JsValue> {
        if self.core.status != CanvasStatus::Ready {
            self.ctx.clear_rect(0.0, 0.0, self.core.viewport_width, self.core.viewport_height);
            return Ok(());
        }
        self.surfaces.sync(&self.core.layers)?;
        render::replay(&self.ctx, &self.core.display_list(now_ms), &self.surfaces)
    }
}
