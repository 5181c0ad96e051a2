use floorplan_designer::viewport::Viewport;
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

#[test]
fn test_zoom_clamps_to_limits() {
    let mut vp = Viewport::new(0.1, 10.0);
    for _ in 0..100 {
        vp.zoom(2.0, 0.0, 0.0);
    }
    assert_eq!(vp.scale(), 10.0);
    assert!(!vp.zoom(2.0, 0.0, 0.0));

    for _ in 0..100 {
        vp.zoom(0.5, 0.0, 0.0);
    }
    assert_eq!(vp.scale(), 0.1);
}

#[test]
fn test_zoom_from_origin_matches_formula() {
    let mut vp = Viewport::default();
    vp.zoom(2.0, 100.0, 50.0);
    // t + a - a * ratio with t = 0
    assert_eq!(vp.translate(), (-100.0, -50.0));
    assert_eq!(vp.scale(), 2.0);
}

#[test]
fn test_reset_restores_identity() {
    let mut vp = Viewport::default();
    vp.zoom(3.0, 40.0, 40.0);
    vp.pan(12.0, -7.0);
    vp.reset();
    assert_eq!(vp.scale(), 1.0);
    assert_eq!(vp.translate(), (0.0, 0.0));
}

proptest! {
    #[test]
    fn prop_transform_round_trip(
        x in -10_000.0f64..10_000.0,
        y in -10_000.0f64..10_000.0,
        scale in 0.1f64..10.0,
        tx in -5_000.0f64..5_000.0,
        ty in -5_000.0f64..5_000.0,
        sx in 0.0f64..500.0,
        sy in 0.0f64..500.0,
    ) {
        let mut vp = Viewport::new(0.1, 10.0);
        vp.set_scale(scale);
        vp.pan(tx, ty);
        vp.set_surface_offset(sx, sy);

        let (screen_x, screen_y) = vp.document_to_screen(x, y);
        let back = vp.screen_to_document(screen_x, screen_y);
        prop_assert!(close(back.x, x), "x: {} != {}", back.x, x);
        prop_assert!(close(back.y, y), "y: {} != {}", back.y, y);
    }

    #[test]
    fn prop_zoom_keeps_anchor_fixed(
        start_scale in 0.1f64..10.0,
        factor in 0.2f64..5.0,
        tx in -2_000.0f64..2_000.0,
        ty in -2_000.0f64..2_000.0,
        ax in 0.0f64..2_000.0,
        ay in 0.0f64..2_000.0,
        sx in 0.0f64..300.0,
        sy in 0.0f64..300.0,
    ) {
        let mut vp = Viewport::new(0.1, 10.0);
        vp.set_scale(start_scale);
        vp.pan(tx, ty);
        vp.set_surface_offset(sx, sy);

        let before = vp.screen_to_document(ax, ay);
        vp.zoom(factor, ax, ay);
        let after = vp.screen_to_document(ax, ay);
        let (screen_x, screen_y) = vp.document_to_screen(after.x, after.y);

        prop_assert!(close(before.x, after.x));
        prop_assert!(close(before.y, after.y));
        prop_assert!(close(screen_x, ax));
        prop_assert!(close(screen_y, ay));
    }
}
