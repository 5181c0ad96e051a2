use floorplan_core::{CalibrationLine, LengthUnit, Point};
use floorplan_designer::{EditorResponse, PointerButton, Tool};

use crate::support::harness;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_calibrate_then_measure() {
    let mut h = harness();
    h.editor.set_tool(Tool::Calibrate).unwrap();
    h.editor.pointer_down(0.0, 0.0, PointerButton::Primary);
    h.editor.pointer_move(60.0, 0.0);
    let response = h.editor.pointer_up(100.0, 0.0, PointerButton::Primary);

    match response {
        EditorResponse::CalibrationRequested {
            page,
            start,
            end,
            document_length,
        } => {
            assert_eq!(page, 0);
            assert_eq!(start, Point::new(0.0, 0.0));
            assert_eq!(end, Point::new(100.0, 0.0));
            assert!(approx(document_length, 100.0));
        }
        other => panic!("expected a calibration request, got {:?}", other),
    }

    let factor = h.editor.complete_calibration(10.0, LengthUnit::Feet).unwrap();
    assert!(approx(factor, 0.1));

    h.editor.set_tool(Tool::Measure).unwrap();
    h.drag((10.0, 10.0), (10.0, 60.0), 4);
    let measurement = h.editor.measurement().unwrap();
    assert!(approx(measurement.document_length, 50.0));
    assert_eq!(measurement.label(), "5.00 ft");
    assert!(approx(measurement.real_in(LengthUnit::Inches).unwrap(), 60.0));

    h.editor.settle().await;
    let stored = h.backend.stored_calibration(0).unwrap();
    assert!(approx(stored.real_world_distance, 10.0));
    assert_eq!(stored.unit, LengthUnit::Feet);
    assert!(approx(h.editor.calibrations().get(0).unwrap().scale_factor(), 0.1));
    assert!(h.editor.visible_markers().is_empty());
}

#[tokio::test]
async fn test_uncalibrated_measurement_uses_document_units() {
    let mut h = harness();
    h.editor.set_tool(Tool::Measure).unwrap();
    h.drag((0.0, 0.0), (30.0, 40.0), 2);

    let measurement = h.editor.measurement().unwrap();
    assert_eq!(measurement.real, None);
    assert_eq!(measurement.label(), "50.0 units");
}

#[tokio::test]
async fn test_degenerate_calibration_line_is_discarded() {
    let mut h = harness();
    h.editor.set_tool(Tool::Calibrate).unwrap();
    h.editor.pointer_down(10.0, 10.0, PointerButton::Primary);
    let response = h.editor.pointer_up(11.0, 10.0, PointerButton::Primary);

    assert!(!matches!(response, EditorResponse::CalibrationRequested { .. }));
    assert!(h.editor.complete_calibration(10.0, LengthUnit::Feet).is_err());
    assert!(h.editor.calibrations().get(0).is_none());
}

#[tokio::test]
async fn test_non_positive_distance_is_rejected() {
    let mut h = harness();
    h.editor.set_tool(Tool::Calibrate).unwrap();
    h.drag((0.0, 0.0), (0.0, 80.0), 2);

    assert!(h.editor.complete_calibration(0.0, LengthUnit::Meters).is_err());
    // The drawn line is kept so a valid distance can still be entered.
    let factor = h.editor.complete_calibration(4.0, LengthUnit::Meters).unwrap();
    assert!(approx(factor, 0.05));
}

#[tokio::test]
async fn test_escape_cancels_pending_calibration() {
    use floorplan_designer::{Key, Modifiers};

    let mut h = harness();
    h.editor.set_tool(Tool::Calibrate).unwrap();
    h.drag((0.0, 0.0), (100.0, 0.0), 2);
    h.editor.key_down(Key::Escape, Modifiers::default());

    assert!(h.editor.complete_calibration(10.0, LengthUnit::Feet).is_err());
    h.editor.settle().await;
    assert!(h.backend.stored_calibration(0).is_none());
}

#[tokio::test]
async fn test_calibration_tool_places_no_markers() {
    let mut h = harness();
    h.editor.set_tool(Tool::Calibrate).unwrap();
    h.drag((0.0, 0.0), (100.0, 0.0), 3);
    assert!(h.editor.store().is_empty());
}

#[tokio::test]
async fn test_stored_zero_length_calibration_is_ignored() {
    let mut h = harness();
    h.backend.seed_calibration(CalibrationLine {
        page: 0,
        start: Point::new(20.0, 20.0),
        end: Point::new(20.0, 20.0),
        pdf_distance: 0.0,
        real_world_distance: 12.0,
        unit: LengthUnit::Feet,
    });
    h.editor.open();
    h.editor.settle().await;

    assert!(h.editor.calibrations().get(0).is_none());
    h.editor.set_tool(Tool::Measure).unwrap();
    h.drag((0.0, 0.0), (30.0, 40.0), 2);
    assert_eq!(h.editor.measurement().unwrap().label(), "50.0 units");
}
