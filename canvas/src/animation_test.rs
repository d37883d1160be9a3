#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn ease_out_cubic_endpoints_and_shape() {
    assert_eq!(ease_out_cubic(0.0), 0.0);
    assert_eq!(ease_out_cubic(1.0), 1.0);
    assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
    assert_eq!(ease_out_cubic(-3.0), 0.0);
    assert_eq!(ease_out_cubic(4.0), 1.0);
}

#[test]
fn ease_out_front_loads_progress() {
    for i in 1..10 {
        let t = f64::from(i) / 10.0;
        assert!(ease_out_cubic(t) > t);
    }
}

#[test]
fn idle_animator_yields_nothing() {
    let mut anim = CenterAnimator::default();
    assert!(!anim.is_active());
    assert!(anim.step(100.0).is_none());
}

#[test]
fn animation_interpolates_and_finishes() {
    let mut anim = CenterAnimator::default();
    anim.start(Point::new(0.0, 0.0), Point::new(100.0, -100.0), 1000.0, 400.0);

    let first = anim.step(1000.0).expect("frame");
    assert_eq!(first.offset, Point::new(0.0, 0.0));
    assert!(!first.finished);

    let mid = anim.step(1200.0).expect("frame");
    assert!((mid.offset.x - 87.5).abs() < 1e-9);
    assert!((mid.offset.y + 87.5).abs() < 1e-9);

    let last = anim.step(1400.0).expect("frame");
    assert_eq!(last.offset, Point::new(100.0, -100.0));
    assert!(last.finished);
    assert!(!anim.is_active());
    assert!(anim.step(1500.0).is_none());
}

#[test]
fn newer_animation_supersedes_older_generation() {
    let mut anim = CenterAnimator::default();
    let old = anim.start(Point::new(0.0, 0.0), Point::new(10.0, 10.0), 0.0, 400.0);
    let new = anim.start(Point::new(5.0, 5.0), Point::new(-10.0, -10.0), 100.0, 400.0);
    assert_ne!(old, new);
    assert_eq!(anim.generation(), new);

    assert!(anim.frame(old, 200.0).is_none(), "stale continuation must be a no-op");
    let f = anim.frame(new, 500.0).expect("current generation");
    assert_eq!(f.offset, Point::new(-10.0, -10.0));
}

#[test]
fn zero_duration_jumps_to_target() {
    let mut anim = CenterAnimator::default();
    anim.start(Point::new(1.0, 1.0), Point::new(9.0, 9.0), 50.0, 0.0);
    let f = anim.step(50.0).expect("frame");
    assert_eq!(f.offset, Point::new(9.0, 9.0));
    assert!(f.finished);
}

#[test]
fn stop_cancels_without_moving() {
    let mut anim = CenterAnimator::default();
    anim.start(Point::new(0.0, 0.0), Point::new(1.0, 1.0), 0.0, 100.0);
    anim.stop();
    assert!(anim.step(50.0).is_none());
}
