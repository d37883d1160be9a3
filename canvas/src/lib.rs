//! Pixel canvas engine for a shared, multi-user pixel grid.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! whole client side of the canvas: the raster the grid is painted into, the
//! pan/zoom viewport, gesture recognition, the placement protocol (selection,
//! challenge, cooldown), the reference-image overlay, and drawing. The host
//! JavaScript layer forwards DOM events and realtime frames to the engine and
//! acts on the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`raster`] | Grid bitmap, preview layer and layer stack |
//! | [`camera`] | Viewport transform and grid/cell geometry |
//! | [`animation`] | Eased centre-on animation with generation tokens |
//! | [`input`] | Raw input event types |
//! | [`gesture`] | Pointer/touch state machine (tap, pan, pinch, overlay drag) |
//! | [`hit`] | Hit-testing the overlay body and its resize handles |
//! | [`overlay`] | Reference image placement, resize and transparency |
//! | [`placement`] | Select, confirm, challenge and cooldown protocol |
//! | [`mode`] | Canvas modes and their rules |
//! | [`sync`] | Realtime requests/events over `frames` |
//! | [`snapshot`] | Initial canvas snapshot loading |
//! | [`render`] | Display list construction and `Canvas2D` replay |
//! | [`config`] | Engine configuration |
//! | [`color`] | Colour parsing and formatting |
//! | [`error`] | Crate error type |
//! | [`consts`] | Shared numeric defaults |

pub mod animation;
pub mod camera;
pub mod color;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod hit;
pub mod input;
pub mod mode;
pub mod overlay;
pub mod placement;
pub mod raster;
pub mod render;
pub mod snapshot;
pub mod sync;
