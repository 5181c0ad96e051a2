use floorplan_core::{MarkerKind, Point};
use floorplan_designer::{PointerButton, Tool};

use crate::support::harness;

#[tokio::test]
async fn test_sub_threshold_rectangle_is_discarded() {
    let mut h = harness();
    h.editor.set_tool(Tool::Rectangle).unwrap();

    h.drag((10.0, 10.0), (13.0, 12.0), 3);
    h.editor.settle().await;

    assert!(h.backend.creates().is_empty());
    assert!(h.editor.store().is_empty());
}

#[tokio::test]
async fn test_threshold_scales_with_zoom() {
    let mut h = harness();
    h.editor.viewport_mut().set_scale(4.0);
    h.editor.set_tool(Tool::Rectangle).unwrap();

    // 3 document units are 12 pixels at 4x, above the 5 pixel threshold.
    h.drag((40.0, 40.0), (52.0, 52.0), 2);
    h.editor.settle().await;

    let creates = h.backend.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].width, Some(3.0));
}

#[tokio::test]
async fn test_rectangle_drag_creates_once_with_size() {
    let mut h = harness();
    h.editor.set_tool(Tool::Rectangle).unwrap();

    h.drag((10.0, 10.0), (60.0, 40.0), 8);
    h.editor.settle().await;

    let creates = h.backend.creates();
    assert_eq!(creates.len(), 1);
    let rect = &creates[0];
    assert_eq!(rect.kind, MarkerKind::Rectangle);
    assert_eq!((rect.x, rect.y), (10.0, 10.0));
    assert_eq!(rect.width, Some(50.0));
    assert_eq!(rect.height, Some(30.0));

    let local = h.only_marker();
    assert_eq!(local.remote_id, Some(1));
    assert_eq!(local.version, 1);
}

#[tokio::test]
async fn test_reversed_drag_is_normalised() {
    let mut h = harness();
    h.editor.set_tool(Tool::Ellipse).unwrap();

    h.drag((60.0, 40.0), (10.0, 10.0), 4);
    h.editor.settle().await;

    let created = &h.backend.creates()[0];
    assert_eq!((created.x, created.y), (10.0, 10.0));
    assert_eq!((created.width, created.height), (Some(50.0), Some(30.0)));
}

#[tokio::test]
async fn test_line_stores_end_and_extent() {
    let mut h = harness();
    h.editor.set_tool(Tool::Line).unwrap();

    h.drag((100.0, 100.0), (70.0, 140.0), 5);
    h.editor.settle().await;

    let line = &h.backend.creates()[0];
    assert_eq!(line.end(), Some(Point::new(70.0, 140.0)));
    assert_eq!((line.width, line.height), (Some(30.0), Some(40.0)));
}

#[tokio::test]
async fn test_polyline_with_one_vertex_is_discarded() {
    let mut h = harness();
    h.editor.set_tool(Tool::Polyline).unwrap();

    h.click(10.0, 10.0);
    h.editor.double_click(10.0, 10.0);
    h.editor.settle().await;

    assert!(h.backend.creates().is_empty());
    assert!(h.editor.interaction().is_idle());
}

#[tokio::test]
async fn test_polyline_keeps_vertices_in_order() {
    let mut h = harness();
    h.editor.set_tool(Tool::Polyline).unwrap();

    h.click(10.0, 10.0);
    h.click(50.0, 10.0);
    h.click(50.0, 60.0);
    // The second click of a double click lands on the last vertex.
    h.click(50.0, 61.0);
    h.editor.double_click(50.0, 61.0);
    h.editor.settle().await;

    let creates = h.backend.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(
        creates[0].points,
        vec![
            Point::new(10.0, 10.0),
            Point::new(50.0, 10.0),
            Point::new(50.0, 60.0)
        ]
    );
    assert_eq!(creates[0].anchor(), Point::new(10.0, 10.0));
}

#[tokio::test]
async fn test_freehand_polyline_skips_close_points() {
    let mut h = harness();
    h.editor.set_tool(Tool::Polygon).unwrap();

    h.editor.pointer_down(0.0, 0.0, PointerButton::Primary);
    for x in 1..=20 {
        h.editor.pointer_move(x as f64, 0.0);
    }
    h.editor.pointer_up(20.0, 0.0, PointerButton::Primary);
    // Moves with the button released do not add vertices.
    h.editor.pointer_move(20.0, 90.0);
    h.editor.double_click(20.0, 0.0);
    h.editor.settle().await;

    let points = &h.backend.creates()[0].points;
    assert_eq!(points.len(), 6);
    assert_eq!(points[1], Point::new(4.0, 0.0));
    assert!(points.windows(2).all(|w| w[0].distance_to(&w[1]) > 3.0));
}

#[tokio::test]
async fn test_switching_tool_discards_unfinished_polyline() {
    let mut h = harness();
    h.editor.set_tool(Tool::Polyline).unwrap();
    h.click(10.0, 10.0);
    h.click(40.0, 10.0);
    assert!(h.editor.preview().is_some());

    h.editor.set_tool(Tool::Select).unwrap();
    h.editor.settle().await;

    assert!(h.editor.preview().is_none());
    assert!(h.backend.creates().is_empty());
}

#[tokio::test]
async fn test_note_is_placed_with_default_text() {
    let mut h = harness();
    h.editor.set_tool(Tool::Note).unwrap();
    h.click(30.0, 30.0);
    h.editor.settle().await;

    let note = &h.backend.creates()[0];
    assert_eq!(note.kind, MarkerKind::Note);
    assert_eq!(note.text_content.as_deref(), Some("New note"));

    let key = h.editor.selection().unwrap();
    h.editor.set_text(key, "Check door closer").unwrap();
    h.editor.settle().await;
    assert_eq!(
        h.backend.stored_marker(1).unwrap().text_content.as_deref(),
        Some("Check door closer")
    );
}

#[tokio::test]
async fn test_markers_use_active_layer() {
    let mut h = harness();
    h.editor.set_active_layer(Some(7));
    h.editor.set_tool(Tool::Text).unwrap();
    h.click(5.0, 5.0);
    h.editor.settle().await;

    assert_eq!(h.backend.creates()[0].layer_id, Some(7));
}
