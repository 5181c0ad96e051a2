//! Per-page calibrations and measurements.
//!
//! A calibration only scales what is displayed; stored geometry is always
//! in document units.

use std::collections::HashMap;

use floorplan_core::units::format_length;
use floorplan_core::{CalibrationLine, LengthUnit, Point};

/// At most one calibration per page.
#[derive(Debug, Clone, Default)]
pub struct CalibrationRegistry {
    lines: HashMap<u32, CalibrationLine>,
}

impl CalibrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: u32) -> Option<&CalibrationLine> {
        self.lines.get(&page)
    }

    /// Stores `line` for its page and returns the calibration it replaced.
    pub fn set(&mut self, line: CalibrationLine) -> Option<CalibrationLine> {
        tracing::debug!(
            "page {} calibrated at {:.4} {}/unit",
            line.page,
            line.scale_factor(),
            line.unit
        );
        self.lines.insert(line.page, line)
    }

    /// Replaces or clears the calibration of `page`.
    pub fn replace(&mut self, page: u32, line: Option<CalibrationLine>) {
        match line {
            Some(line) => {
                self.set(line);
            }
            None => {
                self.lines.remove(&page);
            }
        }
    }

    /// Measures the segment `start`-`end` on `page`.
    pub fn measure(&self, page: u32, start: Point, end: Point) -> Measurement {
        let document_length = start.distance_to(&end);
        Measurement {
            start,
            end,
            document_length,
            real: self
                .get(page)
                .map(|c| (c.to_real_world(document_length), c.unit)),
        }
    }
}

/// Result of measuring a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub start: Point,
    pub end: Point,
    pub document_length: f64,
    /// Real-world length, when the page is calibrated.
    pub real: Option<(f64, LengthUnit)>,
}

impl Measurement {
    /// Real-world length converted to `unit`.
    pub fn real_in(&self, unit: LengthUnit) -> Option<f64> {
        self.real.map(|(value, from)| from.convert(value, unit))
    }

    /// Display text, e.g. `"5.00 ft"` or `"50.0 units"` when uncalibrated.
    pub fn label(&self) -> String {
        match self.real {
            Some((value, unit)) => format_length(value, unit),
            None => format!("{:.1} units", self.document_length),
        }
    }
}
