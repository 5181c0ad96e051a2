use std::sync::Mutex;

use async_trait::async_trait;
use floorplan_core::{EquipmentError, Marker, MarkerKind, Point};
use floorplan_designer::{
    EditorResponse, EquipmentChoice, EquipmentConfigurator, EquipmentRequest, Key, Modifiers,
    PointerButton, Tool,
};

use crate::support::harness;

/// Answers every request with the next scripted result.
struct Form {
    requests: Mutex<Vec<EquipmentRequest>>,
    answers: Mutex<Vec<Result<EquipmentChoice, EquipmentError>>>,
}

impl Form {
    fn answering(answers: Vec<Result<EquipmentChoice, EquipmentError>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            answers: Mutex::new(answers),
        }
    }

    fn requests(&self) -> Vec<EquipmentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EquipmentConfigurator for Form {
    async fn configure(&self, request: EquipmentRequest) -> Result<EquipmentChoice, EquipmentError> {
        self.requests.lock().unwrap().push(request);
        self.answers.lock().unwrap().remove(0)
    }
}

fn selected(equipment_id: i64, label: &str) -> Result<EquipmentChoice, EquipmentError> {
    Ok(EquipmentChoice::Selected {
        equipment_id,
        label: label.to_string(),
    })
}

#[tokio::test]
async fn test_access_point_placement() {
    let mut h = harness();
    h.editor.set_page(1).unwrap();
    h.editor.settle().await;
    h.editor.set_tool(Tool::AccessPoint).unwrap();

    let response = h.editor.pointer_down(120.0, 80.0, PointerButton::Primary);
    h.editor.pointer_up(120.0, 80.0, PointerButton::Primary);
    assert!(matches!(response, EditorResponse::RequestEquipment(_)));
    let request = h.editor.pending_equipment().cloned().unwrap();
    assert_eq!(request.position, Point::new(120.0, 80.0));
    assert_eq!(request.kind, MarkerKind::AccessPoint);
    assert!(h.editor.store().is_empty());

    let form = Form::answering(vec![selected(42, "AP-1")]);
    let key = h.editor.resolve_equipment(&form).await.unwrap();
    h.editor.settle().await;

    let creates = h.backend.creates();
    assert_eq!(creates.len(), 1);
    let created = &creates[0];
    assert_eq!(created.page, 1);
    assert_eq!(created.kind, MarkerKind::AccessPoint);
    assert_eq!((created.x, created.y), (120.0, 80.0));
    assert_eq!(created.equipment_id, Some(42));
    assert_eq!(created.label.as_deref(), Some("AP-1"));

    let marker = h.editor.store().get(&key).unwrap();
    assert_eq!(marker.remote_id, Some(1));
    assert_eq!(h.editor.selection(), Some(key));
    assert_eq!(h.editor.pending_equipment(), None);
}

#[tokio::test]
async fn test_press_returns_equipment_request() {
    let mut h = harness();
    h.editor.set_tool(Tool::Camera).unwrap();
    let response = h.editor.pointer_down(15.0, 25.0, PointerButton::Primary);

    let EditorResponse::RequestEquipment(request) = response else {
        panic!("expected an equipment request, got {:?}", response);
    };
    assert_eq!(request.kind, MarkerKind::Camera);
    assert_eq!(request.position, Point::new(15.0, 25.0));
    assert_eq!(request.existing_equipment_id, None);
    assert_eq!(request.marker, None);
}

#[tokio::test]
async fn test_cancelled_form_creates_nothing() {
    let mut h = harness();
    h.editor.set_tool(Tool::Intercom).unwrap();
    h.click(50.0, 50.0);

    let form = Form::answering(vec![Ok(EquipmentChoice::Cancelled)]);
    assert_eq!(h.editor.resolve_equipment(&form).await, None);
    h.editor.settle().await;

    assert!(h.backend.creates().is_empty());
    assert!(h.editor.store().is_empty());
}

#[tokio::test]
async fn test_unreachable_form_is_reported_and_cancels() {
    let mut h = harness();
    h.editor.set_tool(Tool::Elevator).unwrap();
    h.click(50.0, 50.0);

    let form = Form::answering(vec![Err(EquipmentError::Unavailable {
        reason: "offline".to_string(),
    })]);
    assert_eq!(h.editor.resolve_equipment(&form).await, None);
    h.editor.settle().await;

    assert!(h.backend.creates().is_empty());
    assert_eq!(h.errors().len(), 1);
}

#[tokio::test]
async fn test_escape_drops_pending_request() {
    let mut h = harness();
    h.editor.set_tool(Tool::AccessPoint).unwrap();
    h.click(50.0, 50.0);
    assert!(h.editor.pending_equipment().is_some());

    h.editor.key_down(Key::Escape, Modifiers::default());
    assert_eq!(h.editor.pending_equipment(), None);
    let late = h.editor.complete_equipment(EquipmentChoice::Selected {
        equipment_id: 1,
        label: "late".to_string(),
    });
    assert_eq!(late, None);
}

#[tokio::test]
async fn test_reconfigure_replaces_stale_equipment() {
    let mut h = harness();
    let mut camera = Marker::new(0, MarkerKind::Camera, Point::new(30.0, 30.0));
    camera.equipment_id = Some(5);
    camera.label = Some("CAM-5".to_string());
    camera.version = 1;
    h.backend.seed_marker(camera);
    h.editor.open();
    h.editor.settle().await;
    h.backend.clear_calls();

    let key = h.only_marker().key;
    let EditorResponse::RequestEquipment(request) = h.editor.reconfigure_equipment(key).unwrap()
    else {
        panic!("expected an equipment request");
    };
    assert_eq!(request.existing_equipment_id, Some(5));
    assert_eq!(request.marker, Some(key));

    let form = Form::answering(vec![
        Err(EquipmentError::NotFound { equipment_id: 5 }),
        selected(9, "CAM-9"),
    ]);
    assert_eq!(h.editor.resolve_equipment(&form).await, Some(key));
    h.editor.settle().await;

    let requests = form.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].existing_equipment_id, None);

    assert!(h.backend.creates().is_empty());
    let updates = h.backend.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, 1);
    assert_eq!(updates[0].1.equipment_id, Some(9));
    assert_eq!(h.only_marker().label.as_deref(), Some("CAM-9"));
    assert_eq!(h.only_marker().version, 2);
}

#[tokio::test]
async fn test_reconfigure_rejects_shapes() {
    let mut h = harness();
    h.editor.set_tool(Tool::Note).unwrap();
    h.click(10.0, 10.0);
    let key = h.only_marker().key;

    assert!(h.editor.reconfigure_equipment(key).is_err());
}
