//! Shared numeric defaults for the canvas crate.
//!
//! [`crate::config::EngineConfig`] starts from these; hosts override them per
//! deployment.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed scale, in screen pixels per cell.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed scale, in screen pixels per cell.
pub const MAX_SCALE: f64 = 40.0;

/// Fraction of the viewport the grid occupies after a reset.
pub const FIT_FACTOR: f64 = 0.9;

/// Multiplicative zoom per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Duration of the `center_on` animation.
pub const CENTER_DURATION_MS: f64 = 400.0;

// ── Gestures ────────────────────────────────────────────────────

/// Press displacement (screen pixels) above which a press becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// On-screen edge length of an overlay resize handle.
pub const HANDLE_SIZE_PX: f64 = 12.0;

// ── Placement ───────────────────────────────────────────────────

/// How long a just-confirmed pixel keeps its preview highlight.
pub const PREVIEW_DURATION_MS: f64 = 1000.0;

/// Half-period of the flagged-cell blink.
pub const BLINK_PERIOD_MS: f64 = 500.0;

/// How long cells reported by `peer-removed-cells` keep blinking.
pub const FLAG_DURATION_MS: f64 = 4000.0;

/// Time allowed to answer a confirmation challenge.
pub const CHALLENGE_TIMEOUT_MS: f64 = 10_000.0;

/// Starting lives in elimination mode.
pub const ELIMINATION_LIVES: u32 = 3;

// ── Overlay ─────────────────────────────────────────────────────

/// Minimum overlay width/height in world units.
pub const OVERLAY_MIN_SIZE: f64 = 10.0;

/// Maximum overlay dimension as a multiple of the matching grid dimension.
pub const OVERLAY_MAX_GRID_MULTIPLE: f64 = 3.0;

/// Fraction of the grid an attached overlay is fitted into.
pub const OVERLAY_FIT_FRACTION: f64 = 0.5;

// ── Rendering ───────────────────────────────────────────────────

/// Grid lines are hidden below this many screen pixels per cell.
pub const GRID_MIN_SCALE: f64 = 4.0;

/// One full turn of the decorative border gradient.
pub const BORDER_PERIOD_MS: f64 = 6000.0;

/// Border thickness in screen pixels.
pub const BORDER_WIDTH_PX: f64 = 4.0;

// ── Snapshot ────────────────────────────────────────────────────

/// Largest accepted grid dimension when loading a snapshot.
pub const MAX_GRID_DIM: u32 = 4096;
