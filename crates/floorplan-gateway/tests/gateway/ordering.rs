use floorplan_core::{Marker, MarkerKind, Point};
use floorplan_gateway::{BackendCall, InMemoryBackend, Outcome, PersistenceGateway};
use std::sync::Arc;
use std::time::Duration;

async fn drain(gateway: &mut PersistenceGateway) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    while let Some(outcome) = gateway.next().await {
        outcomes.push(outcome);
    }
    outcomes
}

#[tokio::test]
async fn test_slow_create_is_not_overtaken_by_update() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.delay_creates(Duration::from_millis(40));
    let mut gateway = PersistenceGateway::new(backend.clone(), Duration::from_secs(2));

    let marker = Marker::new(1, MarkerKind::Ellipse, Point::new(0.0, 0.0));
    gateway.create(marker.clone());
    for step in 1..=3 {
        let mut moved = marker.clone();
        moved.move_anchor_to(Point::new(step as f64 * 10.0, 0.0));
        moved.version = step;
        gateway.update(moved);
    }
    assert_eq!(gateway.in_flight(), 4);

    let outcomes = drain(&mut gateway).await;
    assert_eq!(outcomes.len(), 4);
    assert!(gateway.is_idle());

    let calls = backend.calls();
    assert!(matches!(calls[0], BackendCall::CreateMarker(_)));
    let xs: Vec<f64> = backend.updates().iter().map(|(_, m)| m.x).collect();
    assert_eq!(xs, vec![10.0, 20.0, 30.0]);
    assert_eq!(backend.stored_marker(1).map(|m| m.x), Some(30.0));
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let backend = Arc::new(InMemoryBackend::new());
    let mut gateway = PersistenceGateway::new(backend.clone(), Duration::from_secs(2));

    let a = Marker::new(0, MarkerKind::Camera, Point::new(1.0, 1.0));
    let b = Marker::new(0, MarkerKind::Camera, Point::new(1.0, 1.0));
    assert_ne!(a.key, b.key);
    gateway.create(a.clone());
    gateway.create(b.clone());

    let mut ids = Vec::new();
    for outcome in drain(&mut gateway).await {
        match outcome {
            Outcome::Created { key, marker } => {
                assert!(key == a.key || key == b.key);
                ids.push(marker.remote_id);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
    ids.sort();
    assert_eq!(ids, vec![Some(1), Some(2)]);
    assert_eq!(backend.marker_count(), 2);
}

#[tokio::test]
async fn test_delete_waits_for_create() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.delay_creates(Duration::from_millis(20));
    let mut gateway = PersistenceGateway::new(backend.clone(), Duration::from_secs(2));

    let marker = Marker::new(2, MarkerKind::Note, Point::new(3.0, 4.0));
    gateway.create(marker.clone());
    gateway.delete(marker.key, marker.page, None);

    let outcomes = drain(&mut gateway).await;
    assert!(matches!(outcomes.last(), Some(Outcome::Deleted { page: 2, .. })));
    assert_eq!(backend.deletes(), vec![1]);
    assert_eq!(backend.marker_count(), 0);
}

#[tokio::test]
async fn test_fetches_are_answered_in_order() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.seed_marker(Marker::new(0, MarkerKind::Line, Point::new(0.0, 0.0)));
    let mut gateway = PersistenceGateway::new(backend.clone(), Duration::from_secs(2));

    gateway.fetch_markers(0);
    gateway.fetch_calibration(0);
    gateway.fetch_layers();

    let outcomes = drain(&mut gateway).await;
    assert!(matches!(&outcomes[0], Outcome::MarkersLoaded { page: 0, markers } if markers.len() == 1));
    assert!(matches!(
        outcomes[1],
        Outcome::CalibrationLoaded { page: 0, calibration: None }
    ));
    assert!(matches!(&outcomes[2], Outcome::LayersLoaded(layers) if layers.is_empty()));
}
