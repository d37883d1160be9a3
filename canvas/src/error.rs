//! Error taxonomy for the canvas engine.
//!
//! Only snapshot loading is terminal for a canvas. Everything else surfaces
//! to the user as a transient [`crate::placement::Notice`] or is dropped with a
//! log line.

/// Errors produced by the canvas crate.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A colour string was not `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// Engine configuration failed validation.
    #[error("invalid config: {0}")]
    Config(String),

    /// The initial snapshot could not be parsed or describes an impossible canvas.
    #[error("snapshot unavailable: {0}")]
    Snapshot(String),

    /// A realtime payload did not match the expected event shape.
    #[error("malformed {syscall} payload: {reason}")]
    Payload { syscall: String, reason: String },

    /// The sync transport could not accept an outbound request.
    #[error("sync transport failed: {0}")]
    Transport(String),

    /// An overlay image could not be decoded.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (config or snapshot) failed to parse.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
