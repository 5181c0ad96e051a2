//! Real-world length units
//!
//! Calibration maps document distances onto one of these units. Values can
//! be converted between units for display and parsed from the short symbols
//! used by the storage service (`"ft"`, `"in"`, `"m"`, `"cm"`, `"mm"`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length unit for real-world distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Feet
    #[serde(rename = "ft")]
    Feet,
    /// Inches
    #[serde(rename = "in")]
    Inches,
    /// Meters
    #[serde(rename = "m")]
    Meters,
    /// Centimeters
    #[serde(rename = "cm")]
    Centimeters,
    /// Millimeters
    #[serde(rename = "mm")]
    Millimeters,
}

impl Default for LengthUnit {
    fn default() -> Self {
        Self::Feet
    }
}

impl LengthUnit {
    /// Short symbol as shown next to a value.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Feet => "ft",
            Self::Inches => "in",
            Self::Meters => "m",
            Self::Centimeters => "cm",
            Self::Millimeters => "mm",
        }
    }

    /// Length of one unit in meters.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            Self::Feet => 0.3048,
            Self::Inches => 0.0254,
            Self::Meters => 1.0,
            Self::Centimeters => 0.01,
            Self::Millimeters => 0.001,
        }
    }

    /// Converts `value` expressed in `self` into `target` units.
    pub fn convert(&self, value: f64, target: LengthUnit) -> f64 {
        if *self == target {
            return value;
        }
        value * self.meters_per_unit() / target.meters_per_unit()
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ft" | "feet" | "foot" => Ok(Self::Feet),
            "in" | "inch" | "inches" => Ok(Self::Inches),
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Self::Meters),
            "cm" | "centimeter" | "centimeters" => Ok(Self::Centimeters),
            "mm" | "millimeter" | "millimeters" => Ok(Self::Millimeters),
            _ => Err(format!("Unknown length unit: {}", s)),
        }
    }
}

/// Format a real-world length for display
///
/// * `value` - Length expressed in `unit`
/// * `unit` - Unit of `value`
pub fn format_length(value: f64, unit: LengthUnit) -> String {
    format!("{:.2} {}", value, unit.symbol())
}
