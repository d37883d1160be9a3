#![allow(clippy::float_cmp)]

use super::*;
use crate::mode::{ChallengeQuestion, Mode};
use crate::render::DrawCmd;
use crate::snapshot::SnapshotPixel;

// =============================================================
// Helpers
// =============================================================

const RED: Color = Color::rgb(0xff, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 0xff);

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn blank(width: u32, height: u32) -> CanvasSnapshot {
    CanvasSnapshot { width, height, pixels: Vec::new() }
}

/// 10x10 grid in a 500x500 viewport: scale 40, offset (50, 50).
fn ready_core() -> EngineCore {
    ready_core_with(EngineConfig::default(), 10, 10)
}

fn ready_core_with(config: EngineConfig, width: u32, height: u32) -> EngineCore {
    let mut core = EngineCore::new(config, 7);
    core.set_viewport(500.0, 500.0, 1.0);
    core.load_snapshot(&blank(width, height));
    core
}

fn cell_center_on_screen(core: &EngineCore, cell: Cell) -> Point {
    core.viewport.world_to_screen(cell.center())
}

fn click(core: &mut EngineCore, at: Point, now_ms: f64) -> Vec<Action> {
    core.on_pointer_down(at, Button::Primary, no_modifiers());
    core.on_pointer_up(at, Button::Primary, no_modifiers(), now_ms)
}

fn enter(core: &mut EngineCore, now_ms: f64) -> Vec<Action> {
    core.on_key_down(&Key("Enter".into()), no_modifiers(), now_ms)
}

fn submits(actions: &[Action]) -> Vec<&SyncRequest> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Submit(r) => Some(r),
            _ => None,
        })
        .collect()
}

fn has_render(actions: &[Action]) -> bool {
    actions.contains(&Action::RenderNeeded)
}

fn select_and_color(core: &mut EngineCore, cell: Cell, color: Color, now_ms: f64) {
    let at = cell_center_on_screen(core, cell);
    click(core, at, now_ms);
    core.set_palette_color(color);
}

// =============================================================
// Loading and viewport
// =============================================================

#[test]
fn new_core_is_loading() {
    let core = EngineCore::new(EngineConfig::default(), 1);
    assert_eq!(core.status(), &CanvasStatus::Loading);
    assert!(core.is_editable());
}

#[test]
fn load_fits_and_centers_grid() {
    let core = ready_core();
    assert_eq!(core.status(), &CanvasStatus::Ready);
    // 500 / 10 * 0.9 = 45, clamped to max_scale 40.
    assert_eq!(core.viewport.scale, 40.0);
    assert_eq!(core.viewport.offset_x, 50.0);
    assert_eq!(core.viewport.offset_y, 50.0);
}

#[test]
fn load_fits_wide_grid_in_wide_viewport() {
    let mut core = EngineCore::new(EngineConfig::default(), 1);
    core.set_viewport(1000.0, 500.0, 2.0);
    core.load_snapshot(&blank(100, 50));
    assert_eq!(core.viewport.scale, 9.0);
    assert_eq!(core.viewport.offset_x, 50.0);
    assert_eq!(core.viewport.offset_y, 25.0);
    assert_eq!(core.dpr, 2.0);
}

#[test]
fn first_viewport_after_load_fits_grid() {
    let mut core = EngineCore::new(EngineConfig::default(), 1);
    core.load_snapshot(&blank(10, 10));
    core.set_viewport(500.0, 500.0, 1.0);
    assert_eq!(core.viewport.scale, 40.0);
    assert_eq!(core.viewport.offset_x, 50.0);
}

#[test]
fn resize_keeps_user_viewport() {
    let mut core = ready_core();
    core.viewport.pan_by(30.0, 0.0);
    core.set_viewport(800.0, 600.0, 1.0);
    assert_eq!(core.viewport.offset_x, 80.0);
}

#[test]
fn load_reports_status_and_render() {
    let mut core = EngineCore::new(EngineConfig::default(), 1);
    let actions = core.load_snapshot(&blank(4, 4));
    assert_eq!(actions, vec![Action::StatusChanged(CanvasStatus::Ready), Action::RenderNeeded]);
}

#[test]
fn load_paints_snapshot_pixels() {
    let mut core = EngineCore::new(EngineConfig::default(), 1);
    let snapshot = CanvasSnapshot {
        width: 4,
        height: 4,
        pixels: vec![SnapshotPixel { x: 1, y: 2, color: RED }],
    };
    core.load_snapshot(&snapshot);
    assert_eq!(core.read_cell(Cell::new(1, 2)), Some(RED));
    assert_eq!(core.read_cell(Cell::new(0, 0)), Some(Color::WHITE));
}

#[test]
fn malformed_snapshot_makes_canvas_unavailable() {
    let mut core = EngineCore::new(EngineConfig::default(), 1);
    core.set_viewport(500.0, 500.0, 1.0);
    let snapshot = CanvasSnapshot {
        width: 2,
        height: 2,
        pixels: vec![SnapshotPixel { x: 5, y: 0, color: RED }],
    };
    let actions = core.load_snapshot(&snapshot);
    assert!(matches!(core.status(), CanvasStatus::Unavailable(_)));
    assert!(matches!(actions.first(), Some(Action::StatusChanged(CanvasStatus::Unavailable(_)))));
}

#[test]
fn unavailable_canvas_ignores_input() {
    let mut core = EngineCore::new(EngineConfig::default(), 1);
    core.load_failed(&CanvasError::Snapshot("fetch failed".into()));
    assert!(click(&mut core, pt(10.0, 10.0), 0.0).is_empty());
    assert!(enter(&mut core, 0.0).is_empty());
    let event = SyncEvent::PixelUpdate { cell: Cell::new(0, 0), color: RED };
    assert!(core.apply_sync_event(event, 0.0).is_empty());
}

#[test]
fn reload_replaces_grid_and_clears_overlay() {
    let mut core = ready_core();
    core.attach_overlay_image(RgbaImage::new(4, 4));
    core.load_snapshot(&blank(20, 20));
    assert!(core.layers.overlay.is_none());
    assert_eq!(core.layers.grid(), GridSize::new(20, 20));
}

// =============================================================
// Selection and confirm
// =============================================================

#[test]
fn click_selects_cell_and_starts_centering() {
    let mut core = ready_core();
    let cell = Cell::new(3, 4);
    let at = cell_center_on_screen(&core, cell);
    let actions = click(&mut core, at, 0.0);

    let expected = PendingSelection { cell, color: None };
    assert_eq!(actions.first(), Some(&Action::SelectionChanged(Some(expected))));
    assert!(has_render(&actions));
    assert_eq!(core.pending_selection(), Some(expected));
    assert!(core.animator.is_active());
    assert!(core.needs_animation_frame());
}

#[test]
fn click_outside_grid_selects_nothing() {
    let mut core = ready_core();
    let actions = click(&mut core, pt(10.0, 10.0), 0.0);
    assert!(actions.is_empty());
    assert_eq!(core.pending_selection(), None);
}

#[test]
fn select_cell_matches_click() {
    let mut core = ready_core();
    let actions = core.select_cell(Cell::new(3, 4), 0.0);
    assert_eq!(actions.first(), Some(&Action::SelectionChanged(Some(PendingSelection { cell: Cell::new(3, 4), color: None }))));
    assert!(core.select_cell(Cell::new(10, 10), 0.0).is_empty());
}

#[test]
fn selection_outline_uses_chosen_color() {
    let mut core = ready_core();
    let cell = Cell::new(3, 4);
    select_and_color(&mut core, cell, RED, 0.0);

    let origin = core.viewport.cell_to_screen(cell);
    let list = core.display_list(0.0);
    let outline = list.commands.iter().find_map(|c| match c {
        DrawCmd::StrokeRect { rect, color, .. } if rect.x == origin.x && rect.y == origin.y => Some(*color),
        _ => None,
    });
    assert_eq!(outline, Some(RED));
}

#[test]
fn confirm_paints_submits_and_starts_cooldown() {
    let mut core = ready_core();
    let cell = Cell::new(3, 4);
    select_and_color(&mut core, cell, RED, 0.0);

    let actions = core.request_confirm(1000.0);

    assert_eq!(submits(&actions), vec![&SyncRequest::SubmitEdit { cell, color: RED }]);
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert!(actions.contains(&Action::CooldownChanged(CooldownState { active: true, remaining_seconds: 5 })));
    assert_eq!(core.read_cell(cell), Some(RED));
    assert_eq!(core.pending_selection(), None);
    assert!(core.cooldown(1000.0).active);
}

#[test]
fn confirm_without_color_does_nothing() {
    let mut core = ready_core();
    let at = cell_center_on_screen(&core, Cell::new(1, 1));
    click(&mut core, at, 0.0);
    assert!(core.request_confirm(0.0).is_empty());
}

#[test]
fn clicking_another_cell_forgets_previous_color() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(1, 1), RED, 0.0);
    let at = cell_center_on_screen(&core, Cell::new(3, 4));
    click(&mut core, at, 0.0);

    assert_eq!(core.pending_selection(), Some(PendingSelection { cell: Cell::new(3, 4), color: None }));
    assert!(submits(&enter(&mut core, 10.0)).is_empty());
    assert_eq!(core.read_cell(Cell::new(3, 4)), Some(Color::WHITE));
}

#[test]
fn enter_confirms_selection() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(2, 2), BLUE, 0.0);
    let actions = enter(&mut core, 10.0);
    assert_eq!(submits(&actions).len(), 1);
}

#[test]
fn enter_during_cooldown_is_suppressed() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(2, 2), BLUE, 0.0);
    assert_eq!(submits(&enter(&mut core, 0.0)).len(), 1);

    select_and_color(&mut core, Cell::new(3, 3), RED, 100.0);
    assert!(enter(&mut core, 200.0).is_empty());
    assert_eq!(core.read_cell(Cell::new(3, 3)), Some(Color::WHITE));

    // Cooldown of 5s has run out.
    assert_eq!(submits(&enter(&mut core, 5_100.0)).len(), 1);
}

#[test]
fn enter_ignored_while_external_input_has_focus() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(2, 2), BLUE, 0.0);
    core.set_input_focus_external(true);
    assert!(enter(&mut core, 0.0).is_empty());
    assert!(core.pending_selection().is_some());

    core.set_input_focus_external(false);
    assert_eq!(submits(&enter(&mut core, 0.0)).len(), 1);
}

#[test]
fn arrows_nudge_selection_within_grid() {
    let mut core = ready_core();
    let at = cell_center_on_screen(&core, Cell::new(0, 0));
    click(&mut core, at, 0.0);

    let actions = core.on_key_down(&Key("ArrowRight".into()), no_modifiers(), 0.0);
    let moved = PendingSelection { cell: Cell::new(1, 0), color: None };
    assert_eq!(actions.first(), Some(&Action::SelectionChanged(Some(moved))));

    core.on_key_down(&Key("ArrowUp".into()), no_modifiers(), 0.0);
    assert_eq!(core.pending_selection().map(|p| p.cell), Some(Cell::new(1, 0)));
}

#[test]
fn escape_cancels_selection() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(2, 2), BLUE, 0.0);
    let actions = core.on_key_down(&Key("Escape".into()), no_modifiers(), 0.0);
    assert!(actions.contains(&Action::SelectionChanged(None)));
    assert_eq!(core.pending_selection(), None);
}

#[test]
fn view_only_mode_blocks_selection_but_allows_pan() {
    let mut core = ready_core();
    core.set_editable(false);

    let at = cell_center_on_screen(&core, Cell::new(3, 3));
    assert!(click(&mut core, at, 0.0).is_empty());
    assert_eq!(core.pending_selection(), None);
    assert!(!core.display_list(0.0).commands.iter().any(|c| matches!(c, DrawCmd::GridLines { .. })));

    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(140.0, 100.0), no_modifiers());
    assert_eq!(core.viewport.offset_x, 90.0);
}

#[test]
fn leaving_edit_mode_drops_pending_selection() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(2, 2), BLUE, 0.0);
    let actions = core.set_editable(false);
    assert!(actions.contains(&Action::SelectionChanged(None)));
}

// =============================================================
// Remote events
// =============================================================

#[test]
fn remote_update_applies_during_cooldown() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(3, 4), RED, 0.0);
    core.request_confirm(0.0);
    let before = core.cooldown(1000.0);

    let event = SyncEvent::PixelUpdate { cell: Cell::new(0, 0), color: BLUE };
    let actions = core.apply_sync_event(event, 1000.0);

    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert_eq!(core.read_cell(Cell::new(0, 0)), Some(BLUE));
    assert_eq!(core.cooldown(1000.0), before);
}

#[test]
fn repeated_remote_update_is_idempotent() {
    let mut core = ready_core();
    let event = SyncEvent::PixelUpdate { cell: Cell::new(5, 5), color: BLUE };
    assert!(has_render(&core.apply_sync_event(event.clone(), 0.0)));
    assert!(core.apply_sync_event(event, 0.0).is_empty());
    assert_eq!(core.read_cell(Cell::new(5, 5)), Some(BLUE));
}

#[test]
fn cooldown_notice_is_authoritative() {
    let mut core = ready_core();
    let event = SyncEvent::CooldownNotice { active: true, remaining_seconds: 30 };
    let actions = core.apply_sync_event(event, 0.0);
    assert_eq!(actions, vec![Action::CooldownChanged(CooldownState { active: true, remaining_seconds: 30 })]);

    let clear = SyncEvent::CooldownNotice { active: false, remaining_seconds: 0 };
    core.apply_sync_event(clear, 1000.0);
    assert!(!core.cooldown(1000.0).active);
}

#[test]
fn rejection_shows_notice_and_keeps_pixel() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(1, 1), RED, 0.0);
    core.request_confirm(0.0);

    let event = SyncEvent::EditRejected { message: "too fast".into(), remaining_seconds: Some(8) };
    let actions = core.apply_sync_event(event, 500.0);

    assert!(actions.contains(&Action::Notice(Notice::EditRejected { message: "too fast".into() })));
    assert_eq!(core.cooldown(500.0).remaining_seconds, 8);
    assert_eq!(core.read_cell(Cell::new(1, 1)), Some(RED));
}

#[test]
fn peer_removed_cells_are_written_and_flagged() {
    let mut core = ready_core();
    let event = SyncEvent::PeerRemovedCells {
        cells: vec![(Cell::new(1, 1), Color::WHITE), (Cell::new(2, 1), Color::WHITE)],
        actor_name: "mod".into(),
    };
    let actions = core.apply_sync_event(event, 0.0);
    assert!(actions.contains(&Action::Notice(Notice::PeerRemoved { actor_name: "mod".into(), cells: 2 })));
    assert_eq!(core.layers.preview.flagged.len(), 2);
    assert!(core.needs_animation_frame());
}

// =============================================================
// Pan, zoom, pinch
// =============================================================

#[test]
fn drag_pans_without_selecting() {
    let mut core = ready_core();
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers());
    let moved = core.on_pointer_move(pt(130.0, 110.0), no_modifiers());
    let up = core.on_pointer_up(pt(130.0, 110.0), Button::Primary, no_modifiers(), 0.0);

    assert!(has_render(&moved));
    assert!(moved.contains(&Action::SetCursor("grabbing".into())));
    assert!(up.contains(&Action::SetCursor("default".into())));
    assert_eq!(core.viewport.offset_x, 80.0);
    assert_eq!(core.viewport.offset_y, 60.0);
    assert_eq!(core.pending_selection(), None);
}

#[test]
fn small_jitter_still_selects() {
    let mut core = ready_core();
    let at = cell_center_on_screen(&core, Cell::new(3, 3));
    core.on_pointer_down(at, Button::Primary, no_modifiers());
    core.on_pointer_move(pt(at.x + 2.0, at.y + 2.0), no_modifiers());
    core.on_pointer_up(pt(at.x + 2.0, at.y + 2.0), Button::Primary, no_modifiers(), 0.0);
    assert_eq!(core.pending_selection().map(|p| p.cell), Some(Cell::new(3, 3)));
    assert_eq!(core.viewport.offset_x, 50.0);
}

#[test]
fn secondary_button_pans_immediately() {
    let mut core = ready_core();
    core.on_pointer_down(pt(100.0, 100.0), Button::Secondary, no_modifiers());
    core.on_pointer_move(pt(102.0, 100.0), no_modifiers());
    assert_eq!(core.viewport.offset_x, 52.0);
}

#[test]
fn wheel_zooms_around_cursor() {
    let mut core = ready_core();
    let anchor = pt(130.0, 170.0);
    let world_before = core.viewport.screen_to_world(anchor);

    let actions = core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: 100.0 }, no_modifiers());

    assert!(has_render(&actions));
    assert!((core.viewport.scale - 40.0 / 1.1).abs() < 1e-9);
    let world_after = core.viewport.screen_to_world(anchor);
    assert!((world_after.x - world_before.x).abs() < 1e-9);
    assert!((world_after.y - world_before.y).abs() < 1e-9);
}

#[test]
fn wheel_at_max_scale_is_noop() {
    let mut core = ready_core();
    let actions = core.on_wheel(pt(250.0, 250.0), WheelDelta { dx: 0.0, dy: -100.0 }, no_modifiers());
    assert!(actions.is_empty());
    assert_eq!(core.viewport.scale, 40.0);
}

#[test]
fn pinch_out_at_origin_doubles_scale() {
    let mut core = ready_core();
    core.viewport = Viewport { scale: 1.0, offset_x: 250.0, offset_y: 250.0 };

    core.on_touch_start(&[TouchPoint::new(1, 225.0, 250.0), TouchPoint::new(2, 275.0, 250.0)]);
    let actions = core.on_touch_move(&[TouchPoint::new(1, 200.0, 250.0), TouchPoint::new(2, 300.0, 250.0)]);

    assert!(has_render(&actions));
    assert_eq!(core.viewport.scale, 2.0);
    assert_eq!(core.viewport.offset_x, 250.0);
    assert_eq!(core.viewport.offset_y, 250.0);
}

#[test]
fn single_tap_selects_cell() {
    let mut core = ready_core();
    let at = cell_center_on_screen(&core, Cell::new(6, 2));
    core.on_touch_start(&[TouchPoint::new(1, at.x, at.y)]);
    core.on_touch_end(&[], at, 0.0);
    assert_eq!(core.pending_selection().map(|p| p.cell), Some(Cell::new(6, 2)));
}

#[test]
fn hover_sets_cursor_once() {
    let mut core = ready_core();
    let inside = cell_center_on_screen(&core, Cell::new(1, 1));
    assert_eq!(core.on_pointer_move(inside, no_modifiers()), vec![Action::SetCursor("crosshair".into())]);
    assert!(core.on_pointer_move(pt(inside.x + 1.0, inside.y), no_modifiers()).is_empty());
    assert_eq!(core.on_pointer_move(pt(5.0, 5.0), no_modifiers()), vec![Action::SetCursor("default".into())]);
}

// =============================================================
// Centering animation
// =============================================================

#[test]
fn centering_lands_on_selected_cell() {
    let mut core = ready_core();
    let at = cell_center_on_screen(&core, Cell::new(3, 4));
    click(&mut core, at, 0.0);

    let duration = core.config.center_duration_ms;
    let mid = core.tick(duration / 2.0);
    assert!(has_render(&mid));
    assert!(core.animator.is_active());

    core.tick(duration);
    assert!(!core.animator.is_active());
    assert_eq!(core.viewport.offset_x, 250.0 - 3.5 * 40.0);
    assert_eq!(core.viewport.offset_y, 250.0 - 4.5 * 40.0);
}

#[test]
fn newer_center_request_supersedes_older() {
    let mut core = ready_core();
    core.set_target_pixel(Cell::new(0, 0), 0.0);
    let first = core.animator.generation();
    core.set_target_pixel(Cell::new(9, 9), 100.0);
    assert!(core.animator.generation() > first);

    core.tick(100.0 + core.config.center_duration_ms);
    assert_eq!(core.viewport.offset_x, 250.0 - 9.5 * 40.0);
}

#[test]
fn target_pixel_outside_grid_is_ignored() {
    let mut core = ready_core();
    assert!(core.set_target_pixel(Cell::new(10, 0), 0.0).is_empty());
    assert!(!core.animator.is_active());
}

#[test]
fn user_pan_stops_centering() {
    let mut core = ready_core();
    core.set_target_pixel(Cell::new(9, 9), 0.0);
    core.on_pointer_down(pt(100.0, 100.0), Button::Secondary, no_modifiers());
    core.on_pointer_move(pt(110.0, 100.0), no_modifiers());
    assert!(!core.animator.is_active());
    assert_eq!(core.viewport.offset_x, 60.0);
}

#[test]
fn idle_canvas_needs_no_frames() {
    let core = ready_core();
    assert!(!core.needs_animation_frame());
}

#[test]
fn cooldown_alone_needs_ticks_not_frames() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(1, 1), RED, 0.0);
    core.request_confirm(0.0);
    core.tick(2_000.0);

    assert!(core.cooldown(2_000.0).active);
    assert!(!core.needs_animation_frame());
    assert!(core.needs_tick(2_000.0));
    core.tick(5_000.0);
    assert!(!core.needs_tick(5_000.0));
}

#[test]
fn cooldown_countdown_reports_each_second() {
    let mut core = ready_core();
    select_and_color(&mut core, Cell::new(1, 1), RED, 0.0);
    core.request_confirm(0.0);
    core.tick(0.0);

    let actions = core.tick(1_000.0);
    assert!(actions.contains(&Action::CooldownChanged(CooldownState { active: true, remaining_seconds: 4 })));
    assert!(core.tick(1_500.0).iter().all(|a| !matches!(a, Action::CooldownChanged(_))));

    let done = core.tick(5_000.0);
    assert!(done.contains(&Action::CooldownChanged(CooldownState { active: false, remaining_seconds: 0 })));
}

// =============================================================
// Overlay
// =============================================================

/// 100x100 grid: scale 4.5, offset (25, 25). Overlay 20x10 fits to 50x25.
fn core_with_overlay() -> EngineCore {
    let mut core = ready_core_with(EngineConfig::default(), 100, 100);
    core.attach_overlay_image(RgbaImage::new(20, 10));
    core
}

#[test]
fn attaching_overlay_enters_edit_mode() {
    let core = core_with_overlay();
    assert!(core.is_overlay_edit());
    let overlay = core.layers.overlay.as_ref().expect("overlay attached");
    assert_eq!(overlay.size.w, 50.0);
    assert_eq!(overlay.size.h, 25.0);
    assert_eq!(overlay.center(), pt(50.0, 50.0));
    assert_eq!(overlay.serial, 1);
}

#[test]
fn attach_overlay_bytes_rejects_garbage() {
    let mut core = ready_core();
    assert!(matches!(core.attach_overlay_bytes(b"not an image"), Err(CanvasError::Image(_))));
    assert!(core.layers.overlay.is_none());
}

#[test]
fn wheel_scales_overlay_in_edit_mode() {
    let mut core = core_with_overlay();
    let scale = core.viewport.scale;
    let actions = core.on_wheel(pt(250.0, 250.0), WheelDelta { dx: 0.0, dy: -1.0 }, no_modifiers());
    assert!(has_render(&actions));
    assert_eq!(core.viewport.scale, scale);
    let overlay = core.layers.overlay.as_ref().expect("overlay attached");
    assert!((overlay.size.w - 55.0).abs() < 1e-9);
    assert!((overlay.center().x - 50.0).abs() < 1e-9);
    assert!((overlay.center().y - 50.0).abs() < 1e-9);
}

#[test]
fn dragging_overlay_body_moves_it() {
    let mut core = core_with_overlay();
    let offset = core.viewport.offset_x;
    // Overlay centre (50, 50) sits at screen (250, 250).
    core.on_pointer_down(pt(250.0, 250.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(295.0, 250.0), no_modifiers());
    core.on_pointer_up(pt(295.0, 250.0), Button::Primary, no_modifiers(), 0.0);

    let overlay = core.layers.overlay.as_ref().expect("overlay attached");
    assert!((overlay.center().x - 60.0).abs() < 1e-9);
    assert_eq!(core.viewport.offset_x, offset);
    assert_eq!(core.pending_selection(), None);
}

#[test]
fn dragging_se_handle_resizes_overlay() {
    let mut core = core_with_overlay();
    // Overlay spans world (25, 37.5)..(75, 62.5); the SE corner is at screen (362.5, 306.25).
    core.on_pointer_down(pt(362.5, 306.25), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(407.5, 351.25), no_modifiers());
    let actions = core.on_pointer_up(pt(407.5, 351.25), Button::Primary, no_modifiers(), 0.0);

    assert!(has_render(&actions));
    let overlay = core.layers.overlay.as_ref().expect("overlay attached");
    assert!((overlay.size.w - 60.0).abs() < 1e-9);
    assert!((overlay.size.h - 35.0).abs() < 1e-9);
    assert_eq!(overlay.position, pt(25.0, 37.5));
    assert_eq!(core.pending_selection(), None);
}

#[test]
fn right_click_on_overlay_does_not_select() {
    let mut core = core_with_overlay();
    core.on_pointer_down(pt(250.0, 250.0), Button::Secondary, no_modifiers());
    let actions = core.on_pointer_up(pt(250.0, 250.0), Button::Secondary, no_modifiers(), 0.0);
    assert!(actions.is_empty());
    assert_eq!(core.pending_selection(), None);
}

#[test]
fn confirmed_overlay_stops_capturing_input() {
    let mut core = core_with_overlay();
    core.confirm_overlay();
    assert!(!core.is_overlay_edit());
    assert!(core.layers.overlay.as_ref().is_some_and(|o| o.fixed));

    core.on_wheel(pt(250.0, 250.0), WheelDelta { dx: 0.0, dy: 1.0 }, no_modifiers());
    assert!(core.viewport.scale < 4.5);

    // Clicks fall through to the grid.
    click(&mut core, pt(250.0, 250.0), 0.0);
    assert_eq!(core.pending_selection().map(|p| p.cell), Some(Cell::new(50, 50)));
}

#[test]
fn transparency_still_adjustable_after_confirm() {
    let mut core = core_with_overlay();
    core.confirm_overlay();
    assert!(has_render(&core.set_overlay_transparency(0.8)));
    assert_eq!(core.layers.overlay.as_ref().map(|o| o.transparency), Some(0.8));
}

#[test]
fn escape_leaves_overlay_edit() {
    let mut core = core_with_overlay();
    core.on_key_down(&Key("Escape".into()), no_modifiers(), 0.0);
    assert!(!core.is_overlay_edit());
    assert!(core.layers.overlay.is_some());
}

#[test]
fn remove_overlay_discards_it() {
    let mut core = core_with_overlay();
    assert!(has_render(&core.remove_overlay()));
    assert!(core.layers.overlay.is_none());
    assert!(core.remove_overlay().is_empty());
}

// =============================================================
// Challenge modes
// =============================================================

fn challenge_config() -> EngineConfig {
    EngineConfig {
        mode: Mode::TimedChallenge,
        questions: vec![ChallengeQuestion {
            prompt: "2 + 2?".into(),
            choices: vec!["3".into(), "4".into()],
            answer: 1,
        }],
        ..EngineConfig::default()
    }
}

#[test]
fn painting_over_color_opens_challenge() {
    let mut core = ready_core_with(challenge_config(), 10, 10);
    let cell = Cell::new(4, 4);
    core.apply_sync_event(SyncEvent::PixelUpdate { cell, color: BLUE }, 0.0);
    select_and_color(&mut core, cell, RED, 0.0);

    let actions = core.request_confirm(0.0);
    assert!(submits(&actions).is_empty());
    assert!(actions.iter().any(|a| matches!(a, Action::ChallengeOpened(v) if v.cell == cell)));
    assert!(core.challenge(0.0).is_some());

    let answered = core.answer_challenge(1, 1_000.0);
    assert!(answered.contains(&Action::ChallengeClosed));
    assert_eq!(
        submits(&answered),
        vec![&SyncRequest::SubmitChallengeResult { cell, color: RED, success: true }]
    );
    assert_eq!(core.read_cell(cell), Some(RED));
}

#[test]
fn painting_background_cell_skips_challenge() {
    let mut core = ready_core_with(challenge_config(), 10, 10);
    select_and_color(&mut core, Cell::new(4, 4), RED, 0.0);
    let actions = core.request_confirm(0.0);
    assert_eq!(submits(&actions).len(), 1);
}

#[test]
fn challenge_timeout_fails_on_tick() {
    let mut core = ready_core_with(challenge_config(), 10, 10);
    let cell = Cell::new(4, 4);
    core.apply_sync_event(SyncEvent::PixelUpdate { cell, color: BLUE }, 0.0);
    select_and_color(&mut core, cell, RED, 0.0);
    core.request_confirm(0.0);

    let actions = core.tick(core.config.rules().challenge_timeout_ms);
    assert!(actions.contains(&Action::ChallengeClosed));
    assert_eq!(
        submits(&actions),
        vec![&SyncRequest::SubmitChallengeResult { cell, color: RED, success: false }]
    );
    assert_eq!(core.read_cell(cell), Some(BLUE));
}
