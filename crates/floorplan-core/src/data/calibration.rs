use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::ModelError;
use crate::units::LengthUnit;

/// A reference segment that maps document-space length onto a real-world distance.
///
/// At most one calibration exists per page. It never alters stored marker
/// geometry; it only scales measurements for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLine {
    pub page: u32,
    pub start: Point,
    pub end: Point,
    /// Document-space length of the reference segment.
    pub pdf_distance: f64,
    pub real_world_distance: f64,
    pub unit: LengthUnit,
}

impl CalibrationLine {
    /// Builds a calibration from a drawn segment and the distance it represents.
    ///
    /// Zero-length segments and non-positive distances are rejected.
    pub fn new(
        page: u32,
        start: Point,
        end: Point,
        real_world_distance: f64,
        unit: LengthUnit,
    ) -> Result<Self, ModelError> {
        let line = Self {
            page,
            start,
            end,
            pdf_distance: start.distance_to(&end),
            real_world_distance,
            unit,
        };
        line.validate()?;
        Ok(line)
    }

    /// Checks that both distances are finite and positive, so the scale
    /// factor is usable. Lines read back from storage bypass [`new`].
    ///
    /// [`new`]: CalibrationLine::new
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.pdf_distance.is_finite()
            || self.pdf_distance <= f64::EPSILON
            || !self.real_world_distance.is_finite()
            || self.real_world_distance <= 0.0
        {
            return Err(ModelError::DegenerateCalibration);
        }
        Ok(())
    }

    /// Real-world units per document unit.
    pub fn scale_factor(&self) -> f64 {
        self.real_world_distance / self.pdf_distance
    }

    /// Converts a document-space length into real-world units.
    pub fn to_real_world(&self, document_length: f64) -> f64 {
        document_length * self.scale_factor()
    }
}
