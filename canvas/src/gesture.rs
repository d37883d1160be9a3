//! Gesture state machine.
//!
//! ```text
//! Idle ─press─▶ Undetermined ─move > threshold─▶ Panning | DraggingOverlay | ResizingOverlay ─release─▶ Idle
//!                    └──────── release ≤ threshold ──▶ Select ─▶ Idle
//! two fingers ─▶ Pinching ─release─▶ Idle
//! ```
//!
//! The machine only classifies. Each handler returns a [`GestureOutcome`]
//! that the engine applies to the viewport, overlay or placement protocol,
//! so high-frequency pointer state never forces a redraw on its own.
//!
//! A press is a click while its displacement from the press point stays at
//! or below the drag threshold; past it the session is a drag and stays one
//! until release.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use crate::camera::{Point, Viewport};
use crate::hit::OverlayHit;
use crate::input::{Button, TouchPoint};
use crate::overlay::Handle;

/// Fingers closer than this (px) are too noisy to derive a zoom ratio from.
const MIN_PINCH_DIST: f64 = 1.0;

/// Classification of the current pointer session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    /// Pressed, not yet moved past the threshold.
    Undetermined {
        origin: Point,
        origin_world: Point,
        /// Overlay part under the press point, if an unfixed overlay claimed it.
        claim: Option<OverlayHit>,
        /// Only the primary button turns a release into a click.
        clicks: bool,
    },
    Panning {
        last: Point,
    },
    Pinching {
        prev_dist: f64,
    },
    DraggingOverlay {
        last_world: Point,
    },
    ResizingOverlay {
        handle: Handle,
    },
}

/// What the engine should do in response to one input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    None,
    /// Shift the viewport by a screen-space delta.
    Pan { dx: f64, dy: f64 },
    /// Zoom by `factor` keeping `anchor` (screen) fixed.
    Zoom { anchor: Point, factor: f64 },
    /// A click at this screen point.
    Select(Point),
    /// Translate the overlay by a world-space delta.
    MoveOverlay { dx: f64, dy: f64 },
    /// Drag a resize handle to a world point.
    ResizeOverlay { handle: Handle, world: Point },
}

/// Ephemeral per-session interaction state.
#[derive(Debug, Clone, Default)]
pub struct InteractionContext {
    pub mode: GestureMode,
    drag_threshold_px: f64,
}

impl InteractionContext {
    #[must_use]
    pub fn new(drag_threshold_px: f64) -> Self {
        Self { mode: GestureMode::Idle, drag_threshold_px }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.mode == GestureMode::Idle
    }

    /// Drop the current session without producing an outcome.
    pub fn cancel(&mut self) {
        self.mode = GestureMode::Idle;
    }

    /// Start a session. `claim` is the overlay part under the press, already
    /// filtered by the engine (only unfixed overlays in edit mode claim).
    pub fn pointer_down(&mut self, screen: Point, button: Button, claim: Option<OverlayHit>, viewport: &Viewport) -> GestureOutcome {
        self.mode = match (button, claim) {
            (Button::Primary, _) | (_, Some(_)) => GestureMode::Undetermined {
                origin: screen,
                origin_world: viewport.screen_to_world(screen),
                claim,
                clicks: button == Button::Primary,
            },
            (Button::Secondary | Button::Middle, None) => GestureMode::Panning { last: screen },
        };
        GestureOutcome::None
    }

    pub fn pointer_move(&mut self, screen: Point, viewport: &Viewport) -> GestureOutcome {
        let world = viewport.screen_to_world(screen);
        match self.mode {
            GestureMode::Undetermined { origin, origin_world, claim, .. } => {
                if screen.distance(origin) <= self.drag_threshold_px {
                    return GestureOutcome::None;
                }
                self.promote(origin, origin_world, claim, screen, world)
            }
            GestureMode::Panning { last } => {
                self.mode = GestureMode::Panning { last: screen };
                GestureOutcome::Pan { dx: screen.x - last.x, dy: screen.y - last.y }
            }
            GestureMode::DraggingOverlay { last_world } => {
                self.mode = GestureMode::DraggingOverlay { last_world: world };
                GestureOutcome::MoveOverlay { dx: world.x - last_world.x, dy: world.y - last_world.y }
            }
            GestureMode::ResizingOverlay { handle } => GestureOutcome::ResizeOverlay { handle, world },
            GestureMode::Idle | GestureMode::Pinching { .. } => GestureOutcome::None,
        }
    }

    /// End the session. A primary release within the threshold is a click; a release
    /// past it that never saw a move still counts as a drag.
    pub fn pointer_up(&mut self, screen: Point, viewport: &Viewport) -> GestureOutcome {
        let outcome = match self.mode {
            GestureMode::Undetermined { origin, origin_world, claim, clicks } => {
                if screen.distance(origin) > self.drag_threshold_px {
                    self.promote(origin, origin_world, claim, screen, viewport.screen_to_world(screen))
                } else if clicks {
                    GestureOutcome::Select(origin)
                } else {
                    GestureOutcome::None
                }
            }
            GestureMode::Idle | GestureMode::Pinching { .. } => GestureOutcome::None,
            _ => self.pointer_move(screen, viewport),
        };
        self.mode = GestureMode::Idle;
        outcome
    }

    /// Past the threshold: commit to a drag and emit the movement so far.
    fn promote(&mut self, origin: Point, origin_world: Point, claim: Option<OverlayHit>, screen: Point, world: Point) -> GestureOutcome {
        match claim {
            None => {
                self.mode = GestureMode::Panning { last: screen };
                GestureOutcome::Pan { dx: screen.x - origin.x, dy: screen.y - origin.y }
            }
            Some(OverlayHit::Body) => {
                self.mode = GestureMode::DraggingOverlay { last_world: world };
                GestureOutcome::MoveOverlay { dx: world.x - origin_world.x, dy: world.y - origin_world.y }
            }
            Some(OverlayHit::Handle(handle)) => {
                self.mode = GestureMode::ResizingOverlay { handle };
                GestureOutcome::ResizeOverlay { handle, world }
            }
        }
    }

    /// Touches changed: one finger behaves like the primary button, two or
    /// more start a pinch (and abandon any pending click).
    pub fn touch_start(&mut self, touches: &[TouchPoint], claim: Option<OverlayHit>, viewport: &Viewport) -> GestureOutcome {
        match touches {
            [] => GestureOutcome::None,
            [only] => self.pointer_down(only.pos, Button::Primary, claim, viewport),
            [a, b, ..] => {
                self.mode = GestureMode::Pinching { prev_dist: a.pos.distance(b.pos) };
                GestureOutcome::None
            }
        }
    }

    /// Pinch zoom is applied on every move, from the ratio of the current to
    /// the previous finger distance, anchored at the finger midpoint.
    pub fn touch_move(&mut self, touches: &[TouchPoint], viewport: &Viewport) -> GestureOutcome {
        match (self.mode, touches) {
            (GestureMode::Pinching { prev_dist }, [a, b, ..]) => {
                let dist = a.pos.distance(b.pos);
                if prev_dist < MIN_PINCH_DIST || dist < MIN_PINCH_DIST {
                    self.mode = GestureMode::Pinching { prev_dist: dist };
                    return GestureOutcome::None;
                }
                self.mode = GestureMode::Pinching { prev_dist: dist };
                GestureOutcome::Zoom { anchor: a.pos.midpoint(b.pos), factor: dist / prev_dist }
            }
            (GestureMode::Pinching { .. }, _) => GestureOutcome::None,
            (_, [only]) => self.pointer_move(only.pos, viewport),
            _ => GestureOutcome::None,
        }
    }

    /// A finger lifted at `released`; `remaining` are the fingers still down.
    pub fn touch_end(&mut self, remaining: &[TouchPoint], released: Point, viewport: &Viewport) -> GestureOutcome {
        match (self.mode, remaining) {
            (GestureMode::Pinching { .. }, [only]) => {
                // Keep moving with the surviving finger, never as a click.
                self.mode = GestureMode::Panning { last: only.pos };
                GestureOutcome::None
            }
            (GestureMode::Pinching { .. }, [a, b, ..]) => {
                self.mode = GestureMode::Pinching { prev_dist: a.pos.distance(b.pos) };
                GestureOutcome::None
            }
            (_, []) => self.pointer_up(released, viewport),
            _ => GestureOutcome::None,
        }
    }
}
