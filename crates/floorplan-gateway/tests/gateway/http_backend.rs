use floorplan_core::{Marker, MarkerKind, PersistenceError, Point};
use floorplan_gateway::{HttpBackend, HttpBackendConfig, MarkerBackend};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves one canned response and hands back the raw request it received.
async fn one_shot_server(status: &str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
    });

    (format!("http://{}/api", addr), rx)
}

fn backend(base_url: String) -> HttpBackend {
    HttpBackend::new(HttpBackendConfig {
        base_url,
        floorplan_id: 7,
        timeout_ms: 2_000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_create_posts_marker_without_id() {
    let reply = r#"{"id": 55, "page": 1, "kind": "access_point", "x": 120.0, "y": 80.0,
        "equipment_id": 42, "label": "AP-1", "layer_id": null, "version": 1}"#;
    let (url, request) = one_shot_server("201 Created", reply).await;

    let mut marker = Marker::new(1, MarkerKind::AccessPoint, Point::new(120.0, 80.0));
    marker.equipment_id = Some(42);
    marker.label = Some("AP-1".to_string());
    let stored = backend(url).create_marker(&marker).await.unwrap();

    assert_eq!(stored.remote_id, Some(55));
    assert_eq!(stored.version, 1);

    let raw = request.await.unwrap();
    assert!(raw.starts_with("POST /api/floorplans/7/markers HTTP/1.1"));
    let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert!(json.get("id").is_none());
    assert_eq!(json["kind"], "access_point");
    assert_eq!(json["label"], "AP-1");
}

#[tokio::test]
async fn test_list_uses_page_query() {
    let (url, request) = one_shot_server("200 OK", "[]").await;

    let markers = backend(url).list_markers(3).await.unwrap();
    assert!(markers.is_empty());
    assert!(request
        .await
        .unwrap()
        .starts_with("GET /api/floorplans/7/markers?page=3 HTTP/1.1"));
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let (url, _request) = one_shot_server("500 Internal Server Error", "boom").await;

    let err = backend(url).delete_marker(9).await.unwrap_err();
    assert_eq!(
        err,
        PersistenceError::Status {
            status: 500,
            reason: "boom".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_calibration_is_none() {
    let (url, _request) = one_shot_server("404 Not Found", "").await;

    let calibration = backend(url).get_calibration(0).await.unwrap();
    assert!(calibration.is_none());
}
