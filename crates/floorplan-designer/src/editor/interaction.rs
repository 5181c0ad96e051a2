//! Gesture state of the editor.

use floorplan_core::{Marker, MarkerId, Point};

use crate::equipment::EquipmentRequest;

/// The gesture in progress. Exactly one value at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// A drag-sized shape between press and release. Not in the store yet.
    Placing { marker: Marker },
    /// A polyline or polygon collecting vertices. Not in the store yet.
    MultiPointDrawing { marker: Marker, pressed: bool },
    /// A stored marker following the pointer.
    Dragging {
        key: MarkerId,
        /// Pointer position minus marker anchor at press time
        grab_offset: (f64, f64),
        original: Marker,
        was_selected: bool,
        moved: bool,
    },
    /// A stored marker's resize handle following the pointer.
    Resizing {
        key: MarkerId,
        original: Marker,
        moved: bool,
    },
    /// Screen position of the last pan step.
    Panning { last: (f64, f64) },
    Measuring { start: Point, end: Point },
    Calibrating { start: Point, end: Point },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// Stored marker edited by the gesture, if any.
    pub fn target(&self) -> Option<MarkerId> {
        match self {
            Interaction::Dragging { key, .. } | Interaction::Resizing { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Marker being created, drawn on top of the stored ones.
    pub fn preview(&self) -> Option<&Marker> {
        match self {
            Interaction::Placing { marker } | Interaction::MultiPointDrawing { marker, .. } => {
                Some(marker)
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Placing { .. } => "placing",
            Interaction::MultiPointDrawing { .. } => "multi-point-drawing",
            Interaction::Dragging { .. } => "dragging",
            Interaction::Resizing { .. } => "resizing",
            Interaction::Panning { .. } => "panning",
            Interaction::Measuring { .. } => "measuring",
            Interaction::Calibrating { .. } => "calibrating",
        }
    }
}

/// What the host should do after an input event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorResponse {
    #[default]
    None,
    Redraw,
    /// Open the equipment form, then call `complete_equipment`.
    RequestEquipment(EquipmentRequest),
    /// Ask for the real distance of the drawn line, then call
    /// `complete_calibration`.
    CalibrationRequested {
        page: u32,
        start: Point,
        end: Point,
        document_length: f64,
    },
}

impl EditorResponse {
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, EditorResponse::None)
    }
}

/// Whether a document is available to draw on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocumentState {
    #[default]
    NotLoaded,
    Loaded { page_count: u32 },
    /// Placement tools are refused in this state.
    Failed { reason: String },
}
