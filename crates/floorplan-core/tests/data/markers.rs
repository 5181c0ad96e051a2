use floorplan_core::{Marker, MarkerKind, Point, SyncState};

#[test]
fn test_kind_classification() {
    for kind in [
        MarkerKind::AccessPoint,
        MarkerKind::Camera,
        MarkerKind::Elevator,
        MarkerKind::Intercom,
    ] {
        assert!(kind.is_equipment(), "{} should be equipment", kind);
    }
    assert!(!MarkerKind::Note.is_equipment());
    assert!(MarkerKind::Ellipse.is_box());
    assert!(!MarkerKind::Line.is_box());
    assert!(MarkerKind::Polygon.is_multi_point());
}

#[test]
fn test_new_marker_is_pending_and_unpersisted() {
    let m = Marker::new(3, MarkerKind::Note, Point::new(1.0, 2.0));
    assert_eq!(m.sync, SyncState::Pending);
    assert_eq!(m.remote_id, None);
    assert_eq!(m.page, 3);
    assert_eq!(m.version, 0);
}

#[test]
fn test_line_bounds_use_end_point() {
    let mut m = Marker::new(0, MarkerKind::Line, Point::new(10.0, 10.0));
    m.set_end(Point::new(4.0, 30.0));
    m.width = Some(6.0);
    m.height = Some(20.0);

    assert_eq!(m.bounds(), (4.0, 10.0, 10.0, 30.0));
}

#[test]
fn test_move_anchor_carries_vertices() {
    let mut m = Marker::new(0, MarkerKind::Polygon, Point::new(0.0, 0.0));
    m.points = vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
    ];
    m.move_anchor_to(Point::new(5.0, 5.0));

    assert_eq!(m.points[2], Point::new(15.0, 15.0));
}

#[test]
fn test_kind_wire_names() {
    let json = serde_json::to_string(&MarkerKind::AccessPoint).unwrap();
    assert_eq!(json, "\"access_point\"");
    let kind: MarkerKind = serde_json::from_str("\"intercom\"").unwrap();
    assert_eq!(kind, MarkerKind::Intercom);
}
