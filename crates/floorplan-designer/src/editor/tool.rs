//! Tool modes and input primitives.

use std::fmt;

use floorplan_core::MarkerKind;

/// The active interpretation of pointer and keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Measure,
    Calibrate,
    Rectangle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Text,
    Note,
    AccessPoint,
    Camera,
    Elevator,
    Intercom,
    Delete,
}

impl Tool {
    /// Kind of marker this tool places, if any.
    pub fn marker_kind(&self) -> Option<MarkerKind> {
        match self {
            Tool::Rectangle => Some(MarkerKind::Rectangle),
            Tool::Ellipse => Some(MarkerKind::Ellipse),
            Tool::Line => Some(MarkerKind::Line),
            Tool::Polyline => Some(MarkerKind::Polyline),
            Tool::Polygon => Some(MarkerKind::Polygon),
            Tool::Text => Some(MarkerKind::Text),
            Tool::Note => Some(MarkerKind::Note),
            Tool::AccessPoint => Some(MarkerKind::AccessPoint),
            Tool::Camera => Some(MarkerKind::Camera),
            Tool::Elevator => Some(MarkerKind::Elevator),
            Tool::Intercom => Some(MarkerKind::Intercom),
            Tool::Select | Tool::Pan | Tool::Measure | Tool::Calibrate | Tool::Delete => None,
        }
    }

    pub fn places_markers(&self) -> bool {
        self.marker_kind().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Pan => "pan",
            Tool::Measure => "measure",
            Tool::Calibrate => "calibrate",
            Tool::Delete => "delete",
            other => other.marker_kind().map(|k| k.as_str()).unwrap_or("unknown"),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Character(char),
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }
}
