use floorplan_core::{Marker, MarkerKind, ModelError, Point, SyncState};
use floorplan_designer::{DocumentState, Key, Modifiers, Tool};

use crate::support::{harness, white_png, Harness};

async fn with_square() -> Harness {
    let mut h = harness();
    let mut square = Marker::new(0, MarkerKind::Rectangle, Point::new(10.0, 10.0));
    square.width = Some(40.0);
    square.height = Some(40.0);
    square.version = 1;
    h.backend.seed_marker(square);
    h.editor.open();
    h.editor.settle().await;
    h.backend.clear_calls();
    h
}

#[tokio::test]
async fn test_failed_create_can_be_retried() {
    let mut h = harness();
    h.backend.fail_next(1);
    h.editor.set_tool(Tool::Rectangle).unwrap();
    h.drag((10.0, 10.0), (60.0, 40.0), 3);
    h.editor.settle().await;

    let marker = h.only_marker();
    assert_eq!(marker.sync, SyncState::Failed);
    assert_eq!(marker.remote_id, None);
    assert_eq!(h.errors().len(), 1);

    h.editor.retry(marker.key).unwrap();
    h.editor.settle().await;

    let marker = h.only_marker();
    assert_eq!(marker.sync, SyncState::Synced);
    assert_eq!(marker.remote_id, Some(1));
    assert_eq!(h.backend.creates().len(), 2);
    assert_eq!(h.backend.marker_count(), 1);
}

#[tokio::test]
async fn test_failed_update_restores_server_geometry() {
    let mut h = with_square().await;
    h.backend.fail_next(1);
    h.drag((30.0, 30.0), (130.0, 30.0), 4);
    assert_eq!(h.only_marker().x, 110.0);

    h.editor.settle().await;
    let marker = h.only_marker();
    assert_eq!((marker.x, marker.y), (10.0, 10.0));
    assert_eq!(marker.sync, SyncState::Synced);
    assert_eq!(h.errors().len(), 1);
    assert_eq!(h.backend.stored_marker(1).unwrap().x, 10.0);
}

#[tokio::test]
async fn test_failed_delete_brings_marker_back() {
    let mut h = with_square().await;
    h.click(30.0, 30.0);
    h.backend.fail_next(1);
    h.editor.key_down(Key::Delete, Modifiers::default());
    assert!(h.editor.visible_markers().is_empty());

    h.editor.settle().await;
    let marker = h.only_marker();
    assert_eq!(marker.remote_id, Some(1));
    assert_eq!(marker.anchor(), Point::new(10.0, 10.0));
    assert_eq!(h.errors().len(), 1);
}

#[tokio::test]
async fn test_delete_while_create_in_flight() {
    let mut h = harness();
    h.backend.delay_creates(std::time::Duration::from_millis(50));
    h.editor.set_tool(Tool::Note).unwrap();
    h.click(40.0, 40.0);
    let key = h.only_marker().key;

    h.editor.delete_marker(key).unwrap();
    h.editor.settle().await;

    assert!(h.editor.visible_markers().is_empty());
    assert_eq!(h.backend.marker_count(), 0);
    assert_eq!(h.backend.deletes(), vec![1]);
}

#[tokio::test]
async fn test_page_fetch_overtaking_create_keeps_one_marker() {
    let mut h = harness();
    h.backend
        .delay_create_replies(std::time::Duration::from_millis(100));
    h.editor.set_tool(Tool::Rectangle).unwrap();
    h.drag((10.0, 10.0), (60.0, 40.0), 4);
    let key = h.only_marker().key;

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    h.editor.set_page(0).unwrap();
    h.editor.settle().await;

    assert_eq!(h.backend.marker_count(), 1);
    assert_eq!(h.editor.visible_markers().len(), 1);
    let marker = h.only_marker();
    assert_eq!(marker.key, key);
    assert_eq!(marker.remote_id, Some(1));
    assert_eq!(marker.sync, SyncState::Synced);
}

#[tokio::test]
async fn test_unreadable_document_refuses_placement() {
    let mut h = harness();
    h.editor.set_tool(Tool::Rectangle).unwrap();

    assert!(h.editor.load_document(b"garbage").is_err());
    assert!(matches!(
        h.editor.document_state(),
        DocumentState::Failed { .. }
    ));
    assert_eq!(h.editor.tool(), Tool::Select);
    assert!(matches!(
        h.editor.set_tool(Tool::Camera),
        Err(ModelError::ToolUnavailable { .. })
    ));
    assert!(h.editor.set_tool(Tool::Polygon).is_err());
    assert!(h.editor.set_tool(Tool::Select).is_ok());
    assert!(h.editor.set_tool(Tool::Pan).is_ok());
    assert!(h.editor.export_page(0, 1.0).is_err());
    assert_eq!(h.errors().len(), 1);

    h.editor.load_document(&white_png(50, 50)).unwrap();
    assert!(h.editor.set_tool(Tool::Camera).is_ok());
}

#[tokio::test]
async fn test_page_out_of_range() {
    let mut h = harness();
    assert_eq!(h.editor.load_document(&white_png(50, 50)).unwrap(), 1);
    assert!(matches!(
        h.editor.set_page(3),
        Err(ModelError::PageOutOfRange { page: 3, page_count: 1 })
    ));
    assert_eq!(h.editor.page(), 0);
}
