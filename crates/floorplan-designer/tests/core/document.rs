use std::io::Cursor;
use std::sync::Arc;

use floorplan_core::{AppEvent, EventBus, EventCategory, RenderEvent};
use floorplan_designer::{Document, RenderScheduler};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_rapid_requests_deliver_only_the_latest() {
    let document = Arc::new(Document::from_bytes(&png(200, 100)).unwrap());
    let bus = Arc::new(EventBus::with_history(32));
    let mut scheduler = RenderScheduler::new(document, bus.clone());

    let first = scheduler.request(0, 0.5);
    let _second = scheduler.request(0, 1.5);
    let last = scheduler.request(0, 2.0);
    assert!(first.is_cancelled());
    assert!(!last.is_cancelled());

    let rendered = scheduler.settle().await.expect("latest render");
    assert_eq!(rendered.scale, 2.0);
    assert_eq!(rendered.image.dimensions(), (400, 200));
    assert_eq!(scheduler.outstanding(), 0);

    // Superseded renders are not failures.
    let notifications = bus.history_of(EventCategory::Notification);
    assert!(notifications.is_empty());
    let ready: Vec<_> = bus
        .history_of(EventCategory::Render)
        .into_iter()
        .filter(|e| matches!(e, AppEvent::Render(RenderEvent::PageReady { .. })))
        .collect();
    assert_eq!(ready.len(), 1);
}

#[tokio::test]
async fn test_missing_page_reports_failure() {
    let document = Arc::new(Document::from_bytes(&png(10, 10)).unwrap());
    let bus = Arc::new(EventBus::with_history(32));
    let mut scheduler = RenderScheduler::new(document, bus.clone());

    scheduler.request(3, 1.0);
    assert!(scheduler.settle().await.is_none());

    let failures = bus.history_of(EventCategory::Render);
    assert!(matches!(
        failures.as_slice(),
        [AppEvent::Render(RenderEvent::Failed { page: 3, .. })]
    ));
    assert_eq!(bus.history_of(EventCategory::Notification).len(), 1);
}

#[test]
fn test_garbage_bytes_fail_to_load() {
    assert!(Document::from_bytes(b"not a floorplan").is_err());
    assert!(Document::from_bytes(&[]).is_err());
}
