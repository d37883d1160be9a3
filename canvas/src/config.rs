//! Engine configuration.
//!
//! Every field has a default from [`crate::consts`], so hosts only send the
//! keys they want to change:
//!
//! ```json
//! { "max_scale": 64, "mode": "timed_challenge", "background": "#f4f1ea" }
//! ```

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Deserializer, Serialize};

use crate::color::Color;
use crate::consts::*;
use crate::error::CanvasError;
use crate::mode::{ChallengeQuestion, Mode, ModeRules};

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Fraction of the viewport the grid fills after `reset_and_center`.
    pub fit_factor: f64,
    pub wheel_zoom_step: f64,
    pub center_duration_ms: f64,

    pub drag_threshold_px: f64,
    pub handle_size_px: f64,

    pub preview_duration_ms: f64,
    pub blink_period_ms: f64,
    pub flag_duration_ms: f64,

    /// Fill for fresh bitmaps; also the "neutral" colour for challenge gating.
    pub background: Color,
    pub grid_line_color: Color,
    pub grid_min_scale: f64,
    pub border_stops: Vec<Color>,
    pub border_period_ms: f64,
    /// Keep the frame loop alive so the border gradient rotates continuously.
    pub animated_border: bool,

    pub overlay_fit_fraction: f64,
    pub overlay_max_grid_multiple: f64,

    pub mode: Mode,
    /// Per-mode overrides. Keys left out keep that mode's built-in rules.
    #[serde(deserialize_with = "freeform_rules")]
    pub freeform: ModeRules,
    #[serde(deserialize_with = "timed_challenge_rules")]
    pub timed_challenge: ModeRules,
    #[serde(deserialize_with = "elimination_rules")]
    pub elimination: ModeRules,
    pub questions: Vec<ChallengeQuestion>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            fit_factor: FIT_FACTOR,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            center_duration_ms: CENTER_DURATION_MS,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            handle_size_px: HANDLE_SIZE_PX,
            preview_duration_ms: PREVIEW_DURATION_MS,
            blink_period_ms: BLINK_PERIOD_MS,
            flag_duration_ms: FLAG_DURATION_MS,
            background: Color::WHITE,
            grid_line_color: Color::rgba(0, 0, 0, 40),
            grid_min_scale: GRID_MIN_SCALE,
            border_stops: vec![
                Color::rgb(0xff, 0x4d, 0x6d),
                Color::rgb(0xff, 0xb3, 0x47),
                Color::rgb(0x4d, 0xd0, 0xe1),
                Color::rgb(0x7c, 0x4d, 0xff),
            ],
            border_period_ms: BORDER_PERIOD_MS,
            animated_border: false,
            overlay_fit_fraction: OVERLAY_FIT_FRACTION,
            overlay_max_grid_multiple: OVERLAY_MAX_GRID_MULTIPLE,
            mode: Mode::Freeform,
            freeform: ModeRules::for_mode(Mode::Freeform),
            timed_challenge: ModeRules::for_mode(Mode::TimedChallenge),
            elimination: ModeRules::for_mode(Mode::Elimination),
            questions: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Json`] for malformed JSON and
    /// [`CanvasError::Config`] when a value is out of range.
    pub fn from_json(raw: &str) -> Result<Self, CanvasError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CanvasError> {
        let bad = |msg: &str| Err(CanvasError::Config(msg.to_owned()));

        if !(self.min_scale > 0.0 && self.min_scale < self.max_scale) {
            return bad("min_scale must be positive and below max_scale");
        }
        if !(self.fit_factor > 0.0 && self.fit_factor <= 1.0) {
            return bad("fit_factor must be in (0, 1]");
        }
        if self.wheel_zoom_step <= 1.0 {
            return bad("wheel_zoom_step must be greater than 1");
        }
        if self.drag_threshold_px < 0.0 || self.handle_size_px <= 0.0 {
            return bad("drag_threshold_px must be >= 0 and handle_size_px > 0");
        }
        let durations = [
            self.center_duration_ms,
            self.preview_duration_ms,
            self.blink_period_ms,
            self.flag_duration_ms,
            self.border_period_ms,
        ];
        if durations.iter().any(|d| *d <= 0.0) {
            return bad("durations must be positive");
        }
        if self.border_stops.is_empty() {
            return bad("border_stops must not be empty");
        }
        if !(self.overlay_fit_fraction > 0.0 && self.overlay_fit_fraction <= 1.0) {
            return bad("overlay_fit_fraction must be in (0, 1]");
        }
        if self.overlay_max_grid_multiple < 1.0 {
            return bad("overlay_max_grid_multiple must be at least 1");
        }
        let rule_sets = [&self.freeform, &self.timed_challenge, &self.elimination];
        if rule_sets.iter().any(|r| r.challenge_timeout_ms <= 0.0) {
            return bad("challenge_timeout_ms must be positive");
        }
        if let Some(q) = self.questions.iter().find(|q| !q.is_valid()) {
            return Err(CanvasError::Config(format!("question {:?} has no valid answer", q.prompt)));
        }
        Ok(())
    }

    /// Rules for the configured mode.
    #[must_use]
    pub fn rules(&self) -> &ModeRules {
        match self.mode {
            Mode::Freeform => &self.freeform,
            Mode::TimedChallenge => &self.timed_challenge,
            Mode::Elimination => &self.elimination,
        }
    }
}

fn freeform_rules<'de, D: Deserializer<'de>>(d: D) -> Result<ModeRules, D::Error> {
    ModeRules::deserialize_for(Mode::Freeform, d)
}

fn timed_challenge_rules<'de, D: Deserializer<'de>>(d: D) -> Result<ModeRules, D::Error> {
    ModeRules::deserialize_for(Mode::TimedChallenge, d)
}

fn elimination_rules<'de, D: Deserializer<'de>>(d: D) -> Result<ModeRules, D::Error> {
    ModeRules::deserialize_for(Mode::Elimination, d)
}
