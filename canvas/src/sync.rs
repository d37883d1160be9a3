//! Realtime sync boundary.
//!
//! The engine never talks to a socket. It produces [`SyncRequest`]s and
//! consumes [`SyncEvent`]s; this module maps both to and from
//! [`frames::Frame`]s and hands outbound frames to a [`SyncTransport`].
//!
//! | Event | Syscall | Status |
//! |---|---|---|
//! | submit edit | `pixel:place` | request |
//! | submit challenge result | `pixel:challenge` | request |
//! | join | `canvas:join` | request |
//! | pixel update | `pixel:updated` | item / done |
//! | cooldown notice | `cooldown:notice` | item / done |
//! | edit rejected | `pixel:place`, `pixel:challenge` | error |
//! | peer removed cells | `pixel:peer_removed` | item / done |
//!
//! Numbers in frame payloads decode as floats, so coordinates are read as
//! `f64` and checked to be whole, non-negative values.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use frames::{Frame, Status};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::camera::Cell;
use crate::color::Color;
use crate::error::CanvasError;

pub const SYSCALL_PLACE: &str = "pixel:place";
pub const SYSCALL_CHALLENGE: &str = "pixel:challenge";
pub const SYSCALL_UPDATED: &str = "pixel:updated";
pub const SYSCALL_PEER_REMOVED: &str = "pixel:peer_removed";
pub const SYSCALL_COOLDOWN: &str = "cooldown:notice";
pub const SYSCALL_JOIN: &str = "canvas:join";

/// Outbound requests. All are fire-and-forget from the engine's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    SubmitEdit { cell: Cell, color: Color },
    SubmitChallengeResult { cell: Cell, color: Color, success: bool },
    Join,
}

impl SyncRequest {
    #[must_use]
    pub fn syscall(&self) -> &'static str {
        match self {
            Self::SubmitEdit { .. } => SYSCALL_PLACE,
            Self::SubmitChallengeResult { .. } => SYSCALL_CHALLENGE,
            Self::Join => SYSCALL_JOIN,
        }
    }

    /// Build the request frame for `canvas_id`.
    #[must_use]
    pub fn to_frame(&self, canvas_id: &str) -> Frame {
        let data = match self {
            Self::SubmitEdit { cell, color } => json!({ "x": cell.x, "y": cell.y, "color": color.to_hex() }),
            Self::SubmitChallengeResult { cell, color, success } => {
                json!({ "x": cell.x, "y": cell.y, "color": color.to_hex(), "success": success })
            }
            Self::Join => json!({}),
        };
        Frame::request(self.syscall(), Some(canvas_id), data)
    }
}

/// Inbound events the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    PixelUpdate { cell: Cell, color: Color },
    CooldownNotice { active: bool, remaining_seconds: u32 },
    EditRejected { message: String, remaining_seconds: Option<u32> },
    PeerRemovedCells { cells: Vec<(Cell, Color)>, actor_name: String },
}

#[derive(Deserialize)]
struct WirePixel {
    x: f64,
    y: f64,
    color: Color,
}

impl WirePixel {
    fn into_pair(self, syscall: &str) -> Result<(Cell, Color), CanvasError> {
        match (whole(self.x), whole(self.y)) {
            (Some(x), Some(y)) => Ok((Cell::new(x, y), self.color)),
            _ => Err(payload_error(syscall, format!("bad coordinates ({}, {})", self.x, self.y))),
        }
    }
}

#[derive(Deserialize)]
struct WireCooldown {
    active: bool,
    #[serde(default, alias = "remainingSeconds")]
    remaining_seconds: f64,
}

#[derive(Deserialize)]
struct WireRejection {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "remainingSeconds")]
    remaining_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct WirePeerRemoved {
    cells: Vec<WirePixel>,
    #[serde(default, alias = "actorName")]
    actor_name: String,
}

impl SyncEvent {
    /// Interpret an inbound frame.
    ///
    /// Returns `Ok(None)` for frames the engine does not react to (unknown
    /// syscalls, acknowledgements).
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Payload`] when a known event carries a payload
    /// of the wrong shape.
    pub fn from_frame(frame: &Frame) -> Result<Option<Self>, CanvasError> {
        let syscall = frame.syscall.as_str();
        if frame.status == Status::Error {
            if syscall != SYSCALL_PLACE && syscall != SYSCALL_CHALLENGE {
                return Ok(None);
            }
            let wire: WireRejection = parse(frame)?;
            return Ok(Some(Self::EditRejected {
                message: wire.message.unwrap_or_else(|| "edit rejected".to_owned()),
                remaining_seconds: wire.remaining_seconds.map(seconds),
            }));
        }

        let event = match syscall {
            SYSCALL_UPDATED => {
                let (cell, color) = parse::<WirePixel>(frame)?.into_pair(syscall)?;
                Self::PixelUpdate { cell, color }
            }
            SYSCALL_COOLDOWN => {
                let wire: WireCooldown = parse(frame)?;
                Self::CooldownNotice { active: wire.active, remaining_seconds: seconds(wire.remaining_seconds) }
            }
            SYSCALL_PEER_REMOVED => {
                let wire: WirePeerRemoved = parse(frame)?;
                let cells = wire
                    .cells
                    .into_iter()
                    .map(|p| p.into_pair(syscall))
                    .collect::<Result<Vec<_>, _>>()?;
                Self::PeerRemovedCells { cells, actor_name: wire.actor_name }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn parse<T: DeserializeOwned>(frame: &Frame) -> Result<T, CanvasError> {
    serde_json::from_value(frame.data.clone()).map_err(|e| payload_error(&frame.syscall, e.to_string()))
}

fn payload_error(syscall: &str, reason: String) -> CanvasError {
    CanvasError::Payload { syscall: syscall.to_owned(), reason }
}

/// A non-negative whole number that fits a cell coordinate.
fn whole(v: f64) -> Option<u32> {
    (v.is_finite() && v >= 0.0 && v.fract().abs() < f64::EPSILON && v <= f64::from(u32::MAX)).then_some(v as u32)
}

/// Round a (possibly fractional) second count up; negatives become zero.
fn seconds(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 { v.ceil().min(f64::from(u32::MAX)) as u32 } else { 0 }
}

/// Where outbound frames go. Implemented by the host's socket writer.
pub trait SyncTransport {
    /// Queue one frame for sending.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Transport`] if the frame cannot be queued.
    fn send_frame(&mut self, frame: Frame) -> Result<(), CanvasError>;
}

/// Binds a transport to one canvas.
#[derive(Debug)]
pub struct SyncClient<T> {
    canvas_id: String,
    transport: T,
}

impl<T: SyncTransport> SyncClient<T> {
    pub fn new(canvas_id: impl Into<String>, transport: T) -> Self {
        Self { canvas_id: canvas_id.into(), transport }
    }

    #[must_use]
    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    /// Send a request. Fire-and-forget: a failed send is logged and the
    /// optimistic local state stands. Returns the sent frame's id.
    pub fn submit(&mut self, request: &SyncRequest) -> Option<String> {
        let frame = request.to_frame(&self.canvas_id);
        let id = frame.id.clone();
        match self.transport.send_frame(frame) {
            Ok(()) => {
                tracing::debug!(syscall = request.syscall(), canvas = %self.canvas_id, "sync request sent");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(syscall = request.syscall(), error = %e, "sync request dropped");
                None
            }
        }
    }

    /// Interpret an inbound frame for this canvas. Frames for other canvases,
    /// unknown syscalls and malformed payloads yield `None`.
    #[must_use]
    pub fn receive(&self, frame: &Frame) -> Option<SyncEvent> {
        if frame.canvas_id.as_deref().is_some_and(|id| id != self.canvas_id) {
            tracing::debug!(syscall = %frame.syscall, canvas = ?frame.canvas_id, "frame for another canvas");
            return None;
        }
        match SyncEvent::from_frame(frame) {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                tracing::debug!(syscall = %frame.syscall, status = ?frame.status, "ignoring frame");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                None
            }
        }
    }
}
