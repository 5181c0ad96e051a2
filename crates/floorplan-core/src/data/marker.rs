use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{LayerId, Point};

/// Stable client-side key for a marker.
///
/// Generated locally for every marker (including ones loaded from the
/// service) so that concurrent creations never collide and so that the key
/// survives the server assigning its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(Uuid);

impl MarkerId {
    /// Create a new random marker key
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Kind of annotation placed on a floorplan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Rectangle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    AccessPoint,
    Camera,
    Elevator,
    Intercom,
    Note,
    Text,
}

impl MarkerKind {
    /// Equipment pins reference a record in the external equipment store.
    pub fn is_equipment(&self) -> bool {
        matches!(
            self,
            Self::AccessPoint | Self::Camera | Self::Elevator | Self::Intercom
        )
    }

    /// Box-like shapes sized by `width`/`height`.
    pub fn is_box(&self) -> bool {
        matches!(self, Self::Rectangle | Self::Ellipse)
    }

    /// Shapes defined by an ordered vertex list.
    pub fn is_multi_point(&self) -> bool {
        matches!(self, Self::Polyline | Self::Polygon)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Line => "line",
            Self::Polyline => "polyline",
            Self::Polygon => "polygon",
            Self::AccessPoint => "access_point",
            Self::Camera => "camera",
            Self::Elevator => "elevator",
            Self::Intercom => "intercom",
            Self::Note => "note",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-marker style overrides. `None` fields inherit from the owning layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

/// Where a marker stands relative to the storage service. Client-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// A request for this marker is in flight
    #[default]
    Pending,
    /// The local record matches the last server response
    Synced,
    /// The last request for this marker failed
    Failed,
}

/// A persisted annotation anchored in document space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(skip)]
    pub key: MarkerId,
    /// Server-assigned identifier, `None` until the create succeeds.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<i64>,
    pub page: u32,
    pub kind: MarkerKind,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(flatten)]
    pub style: MarkerStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default)]
    pub layer_id: Option<LayerId>,
    #[serde(default)]
    pub version: u32,
    #[serde(skip)]
    pub sync: SyncState,
}

impl Marker {
    /// Creates an unpersisted marker anchored at `at`.
    pub fn new(page: u32, kind: MarkerKind, at: Point) -> Self {
        Self {
            key: MarkerId::new(),
            remote_id: None,
            page,
            kind,
            x: at.x,
            y: at.y,
            end_x: None,
            end_y: None,
            width: None,
            height: None,
            points: Vec::new(),
            style: MarkerStyle::default(),
            equipment_id: None,
            label: None,
            text_content: None,
            layer_id: None,
            version: 0,
            sync: SyncState::Pending,
        }
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The second point of a two-point shape, if set.
    pub fn end(&self) -> Option<Point> {
        match (self.end_x, self.end_y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    pub fn set_end(&mut self, end: Point) {
        self.end_x = Some(end.x);
        self.end_y = Some(end.y);
    }

    /// Shifts the whole geometry by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        if let Some(ex) = self.end_x.as_mut() {
            *ex += dx;
        }
        if let Some(ey) = self.end_y.as_mut() {
            *ey += dy;
        }
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Moves the anchor to `anchor`, carrying the rest of the geometry along.
    pub fn move_anchor_to(&mut self, anchor: Point) {
        self.translate(anchor.x - self.x, anchor.y - self.y);
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_x = self.x;
        let mut min_y = self.y;
        let mut max_x = self.x;
        let mut max_y = self.y;
        let mut include = |p: Point| {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        };

        if let Some(end) = self.end() {
            include(end);
        }
        if self.kind.is_box() {
            if let (Some(w), Some(h)) = (self.width, self.height) {
                include(Point::new(self.x + w, self.y + h));
            }
        }
        for p in &self.points {
            include(*p);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Copy with a fresh key and no server identity.
    pub fn duplicate(&self, dx: f64, dy: f64) -> Marker {
        let mut copy = self.clone();
        copy.key = MarkerId::new();
        copy.remote_id = None;
        copy.version = 0;
        copy.sync = SyncState::Pending;
        copy.translate(dx, dy);
        copy
    }
}
