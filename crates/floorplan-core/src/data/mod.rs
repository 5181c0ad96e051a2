//! Document-space data model.
//!
//! Every coordinate stored here is in document space, the native coordinate
//! system of the underlying paginated document. Viewport pixels never reach
//! these types.

mod calibration;
mod layer;
mod marker;

pub use calibration::CalibrationLine;
pub use layer::{Layer, LayerId};
pub use marker::{Marker, MarkerId, MarkerKind, MarkerStyle, SyncState};

use serde::{Deserialize, Serialize};

/// A point in document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}
