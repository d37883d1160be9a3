//! Hit-testing against the overlay image.
//!
//! Handle hot-zones are a fixed on-screen size converted to world units by
//! dividing by the current scale, so they stay the same visual size at any
//! zoom level. Handles are tested before the body.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, Viewport};
use crate::overlay::{Handle, OverlayImage};

/// Which part of the overlay was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayHit {
    Body,
    Handle(Handle),
}

impl OverlayHit {
    /// CSS cursor for hovering this part.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Body => "move",
            Self::Handle(h) => h.cursor(),
        }
    }
}

/// Test `world_pt` against an unfixed overlay. Fixed overlays are inert.
#[must_use]
pub fn hit_overlay(world_pt: Point, overlay: &OverlayImage, viewport: &Viewport, handle_px: f64) -> Option<OverlayHit> {
    if overlay.fixed {
        return None;
    }
    let half = viewport.screen_dist_to_world(handle_px) * 0.5;
    for handle in Handle::ALL {
        let p = overlay.handle_point(handle);
        if (world_pt.x - p.x).abs() <= half && (world_pt.y - p.y).abs() <= half {
            return Some(OverlayHit::Handle(handle));
        }
    }
    overlay.contains(world_pt).then_some(OverlayHit::Body)
}
