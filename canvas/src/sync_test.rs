use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn inbound(syscall: &str, status: Status, data: serde_json::Value) -> Frame {
    let mut frame = Frame::request(syscall, Some("c1"), data);
    frame.status = status;
    frame
}

// =============================================================
// Outbound
// =============================================================

#[test]
fn submit_edit_frame_shape() {
    let req = SyncRequest::SubmitEdit { cell: Cell::new(3, 4), color: Color::rgb(255, 0, 0) };
    let frame = req.to_frame("c1");
    assert_eq!(frame.syscall, "pixel:place");
    assert_eq!(frame.status, Status::Request);
    assert_eq!(frame.canvas_id.as_deref(), Some("c1"));
    assert_eq!(frame.data, json!({ "x": 3, "y": 4, "color": "#ff0000" }));
}

#[test]
fn challenge_result_carries_success() {
    let req = SyncRequest::SubmitChallengeResult { cell: Cell::new(1, 2), color: Color::BLACK, success: false };
    let frame = req.to_frame("c1");
    assert_eq!(frame.syscall, "pixel:challenge");
    assert_eq!(frame.data["success"], json!(false));
}

#[test]
fn join_frame_has_empty_payload() {
    let frame = SyncRequest::Join.to_frame("c9");
    assert_eq!(frame.syscall, "canvas:join");
    assert_eq!(frame.data, json!({}));
}

// =============================================================
// Inbound
// =============================================================

#[test]
fn pixel_update_accepts_float_coordinates() {
    let frame = inbound("pixel:updated", Status::Item, json!({ "x": 3.0, "y": 4.0, "color": "#00ff00" }));
    assert_eq!(
        SyncEvent::from_frame(&frame).expect("valid"),
        Some(SyncEvent::PixelUpdate { cell: Cell::new(3, 4), color: Color::rgb(0, 255, 0) })
    );
}

#[test]
fn pixel_update_rejects_fractional_or_negative_coordinates() {
    for (x, y) in [(1.5, 2.0), (-1.0, 0.0), (f64::from(u32::MAX) * 2.0, 0.0)] {
        let frame = inbound("pixel:updated", Status::Item, json!({ "x": x, "y": y, "color": "#000" }));
        assert!(matches!(SyncEvent::from_frame(&frame), Err(CanvasError::Payload { .. })), "({x}, {y})");
    }
}

#[test]
fn pixel_update_rejects_bad_color() {
    let frame = inbound("pixel:updated", Status::Item, json!({ "x": 1, "y": 1, "color": "red" }));
    assert!(matches!(SyncEvent::from_frame(&frame), Err(CanvasError::Payload { .. })));
}

#[test]
fn cooldown_notice_rounds_up_and_accepts_camel_case() {
    let frame = inbound("cooldown:notice", Status::Item, json!({ "active": true, "remainingSeconds": 4.2 }));
    assert_eq!(
        SyncEvent::from_frame(&frame).expect("valid"),
        Some(SyncEvent::CooldownNotice { active: true, remaining_seconds: 5 })
    );
}

#[test]
fn cooldown_notice_negative_is_zero() {
    let frame = inbound("cooldown:notice", Status::Done, json!({ "active": false, "remaining_seconds": -3 }));
    assert_eq!(
        SyncEvent::from_frame(&frame).expect("valid"),
        Some(SyncEvent::CooldownNotice { active: false, remaining_seconds: 0 })
    );
}

#[test]
fn error_on_place_is_rejection() {
    let frame = inbound("pixel:place", Status::Error, json!({ "message": "cooldown active", "remaining_seconds": 7 }));
    assert_eq!(
        SyncEvent::from_frame(&frame).expect("valid"),
        Some(SyncEvent::EditRejected { message: "cooldown active".into(), remaining_seconds: Some(7) })
    );
}

#[test]
fn rejection_without_message_gets_default() {
    let frame = inbound("pixel:challenge", Status::Error, json!({}));
    assert_eq!(
        SyncEvent::from_frame(&frame).expect("valid"),
        Some(SyncEvent::EditRejected { message: "edit rejected".into(), remaining_seconds: None })
    );
}

#[test]
fn errors_on_other_syscalls_are_ignored() {
    let frame = inbound("canvas:join", Status::Error, json!({ "message": "nope" }));
    assert_eq!(SyncEvent::from_frame(&frame).expect("ok"), None);
}

#[test]
fn peer_removed_parses_cells() {
    let frame = inbound(
        "pixel:peer_removed",
        Status::Item,
        json!({ "cells": [{ "x": 1, "y": 2, "color": "#ffffff" }, { "x": 3.0, "y": 4.0, "color": "#000000" }], "actorName": "mara" }),
    );
    assert_eq!(
        SyncEvent::from_frame(&frame).expect("valid"),
        Some(SyncEvent::PeerRemovedCells {
            cells: vec![(Cell::new(1, 2), Color::WHITE), (Cell::new(3, 4), Color::BLACK)],
            actor_name: "mara".into(),
        })
    );
}

#[test]
fn unknown_syscall_and_acks_are_ignored() {
    let unknown = inbound("chat:message", Status::Item, json!({ "text": "hi" }));
    assert_eq!(SyncEvent::from_frame(&unknown).expect("ok"), None);
    let ack = inbound("pixel:place", Status::Done, json!({}));
    assert_eq!(SyncEvent::from_frame(&ack).expect("ok"), None);
}

// =============================================================
// Client
// =============================================================

/// Records sent frames in a shared buffer the test can inspect.
#[derive(Default, Clone)]
struct Recorder(Rc<RefCell<Vec<Frame>>>);

impl SyncTransport for Recorder {
    fn send_frame(&mut self, frame: Frame) -> Result<(), CanvasError> {
        self.0.borrow_mut().push(frame);
        Ok(())
    }
}

struct Closed;

impl SyncTransport for Closed {
    fn send_frame(&mut self, _frame: Frame) -> Result<(), CanvasError> {
        Err(CanvasError::Transport("socket closed".into()))
    }
}

#[test]
fn client_submit_buffers_frame() {
    let recorder = Recorder::default();
    let mut client = SyncClient::new("c1", recorder.clone());
    let id = client.submit(&SyncRequest::Join).expect("sent");
    let sent = recorder.0.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id, id);
    assert_eq!(sent[0].canvas_id.as_deref(), Some("c1"));
}

#[test]
fn client_submit_failure_is_swallowed() {
    let mut client = SyncClient::new("c1", Closed);
    assert!(client.submit(&SyncRequest::Join).is_none());
}

#[test]
fn client_receive_filters_other_canvases_and_malformed() {
    let client = SyncClient::new("c1", Recorder::default());
    let mut other = inbound("pixel:updated", Status::Item, json!({ "x": 1, "y": 1, "color": "#000" }));
    other.canvas_id = Some("c2".into());
    assert_eq!(client.receive(&other), None);

    let bad = inbound("pixel:updated", Status::Item, json!({ "x": "one" }));
    assert_eq!(client.receive(&bad), None);

    let good = inbound("pixel:updated", Status::Item, json!({ "x": 1, "y": 1, "color": "#000" }));
    assert_eq!(client.receive(&good), Some(SyncEvent::PixelUpdate { cell: Cell::new(1, 1), color: Color::BLACK }));
}

#[test]
fn client_receive_accepts_frames_without_canvas_id() {
    let client = SyncClient::new("c1", Recorder::default());
    let mut frame = inbound("cooldown:notice", Status::Item, json!({ "active": true, "remaining_seconds": 3 }));
    frame.canvas_id = None;
    assert!(client.receive(&frame).is_some());
}
