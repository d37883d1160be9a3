//! Animated viewport centring.
//!
//! `center_on` interpolates the viewport offset with an ease-out cubic curve,
//! sampled once per animation frame. Starting a new animation bumps a
//! generation counter; a frame callback that still carries an older
//! generation samples nothing, so two loops can never drive the same
//! viewport.

#[cfg(test)]
#[path = "animation_test.rs"]
mod animation_test;

use crate::camera::Point;

/// `1 - (1 - t)^3`, with `t` clamped to `[0, 1]`.
#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OffsetTween {
    from: Point,
    to: Point,
    start_ms: f64,
    duration_ms: f64,
}

impl OffsetTween {
    fn sample(&self, now_ms: f64) -> (Point, bool) {
        let t = if self.duration_ms <= 0.0 {
            1.0
        } else {
            ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
        };
        let k = ease_out_cubic(t);
        let p = Point::new(
            self.from.x + (self.to.x - self.from.x) * k,
            self.from.y + (self.to.y - self.from.y) * k,
        );
        (p, t >= 1.0)
    }
}

/// One sampled animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetFrame {
    pub offset: Point,
    /// `true` on the last frame; the animation is gone afterwards.
    pub finished: bool,
}

/// Owner of the single in-flight centring animation.
#[derive(Debug, Default)]
pub struct CenterAnimator {
    generation: u64,
    active: Option<OffsetTween>,
}

impl CenterAnimator {
    /// Start animating the offset from `from` to `to`, superseding any
    /// running animation. Returns the new generation.
    pub fn start(&mut self, from: Point, to: Point, now_ms: f64, duration_ms: f64) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.active = Some(OffsetTween { from, to, start_ms: now_ms, duration_ms });
        self.generation
    }

    /// Generation of the most recently started animation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Drop the running animation, leaving the offset where it is.
    pub fn stop(&mut self) {
        self.active = None;
    }

    /// Sample the frame for a callback scheduled under `generation`.
    ///
    /// Stale generations and idle animators yield `None`.
    pub fn frame(&mut self, generation: u64, now_ms: f64) -> Option<OffsetFrame> {
        if generation != self.generation {
            return None;
        }
        let tween = self.active?;
        let (offset, finished) = tween.sample(now_ms);
        if finished {
            self.active = None;
        }
        Some(OffsetFrame { offset, finished })
    }

    /// Sample the current animation, if any.
    pub fn step(&mut self, now_ms: f64) -> Option<OffsetFrame> {
        self.frame(self.generation, now_ms)
    }
}
