//! Viewport and coordinate transformation.
//!
//! Maps between three spaces:
//! - **document space**: native units of the page, independent of zoom/pan
//! - **viewport space**: pixels of the rendered page surface at `scale`
//! - **screen space**: input-device coordinates, i.e. viewport space shifted
//!   by where the surface sits on screen
//!
//! `scale` (document -> pixel) is the single source of truth for
//! magnification; every other size is derived from it.

use std::fmt;

use floorplan_core::constants::{MAX_SCALE, MIN_SCALE};
use floorplan_core::Point;

/// Zoom, pan and surface placement of the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    scale: f64,
    translate_x: f64,
    translate_y: f64,
    surface_x: f64,
    surface_y: f64,
    min_scale: f64,
    max_scale: f64,
}

impl Viewport {
    /// Creates a viewport at 1:1 with the given scale limits.
    ///
    /// Limits are sanitised so that `0 < min_scale <= max_scale`.
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        let min_scale = if min_scale > 0.0 && min_scale.is_finite() {
            min_scale
        } else {
            MIN_SCALE
        };
        let max_scale = if max_scale.is_finite() {
            max_scale.max(min_scale)
        } else {
            MAX_SCALE.max(min_scale)
        };
        Self {
            scale: 1.0_f64.clamp(min_scale, max_scale),
            translate_x: 0.0,
            translate_y: 0.0,
            surface_x: 0.0,
            surface_y: 0.0,
            min_scale,
            max_scale,
        }
    }

    /// Current document-to-pixel scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> (f64, f64) {
        (self.translate_x, self.translate_y)
    }

    pub fn scale_limits(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    /// Sets the on-screen position of the rendering surface's origin.
    pub fn set_surface_offset(&mut self, x: f64, y: f64) {
        self.surface_x = x;
        self.surface_y = y;
    }

    pub fn surface_offset(&self) -> (f64, f64) {
        (self.surface_x, self.surface_y)
    }

    /// Sets the scale directly, clamped to the limits. Translation is kept.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = scale.clamp(self.min_scale, self.max_scale);
        }
    }

    /// Converts screen coordinates to document coordinates.
    ///
    /// ```text
    /// doc = (screen - surface_offset - translate) / scale
    /// ```
    pub fn screen_to_document(&self, screen_x: f64, screen_y: f64) -> Point {
        Point::new(
            (screen_x - self.surface_x - self.translate_x) / self.scale,
            (screen_y - self.surface_y - self.translate_y) / self.scale,
        )
    }

    /// Converts document coordinates to screen coordinates.
    pub fn document_to_screen(&self, doc_x: f64, doc_y: f64) -> (f64, f64) {
        (
            doc_x * self.scale + self.translate_x + self.surface_x,
            doc_y * self.scale + self.translate_y + self.surface_y,
        )
    }

    /// Converts document coordinates to viewport (surface) pixels.
    pub fn document_to_viewport(&self, doc_x: f64, doc_y: f64) -> (f64, f64) {
        (
            doc_x * self.scale + self.translate_x,
            doc_y * self.scale + self.translate_y,
        )
    }

    /// Converts a length in viewport pixels to document units.
    pub fn pixels_to_document(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }

    /// Multiplies the scale by `factor`, keeping the document point under
    /// the screen anchor fixed.
    ///
    /// With the anchor `a` taken relative to the surface origin, the new
    /// translation is `a - (a - t) * (new_scale / scale)`. Returns false
    /// when the clamped scale did not change.
    pub fn zoom(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) -> bool {
        if !(factor > 0.0 && factor.is_finite()) {
            return false;
        }
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let ratio = new_scale / self.scale;
        let ax = anchor_x - self.surface_x;
        let ay = anchor_y - self.surface_y;
        self.translate_x = ax - (ax - self.translate_x) * ratio;
        self.translate_y = ay - (ay - self.translate_y) * ratio;
        self.scale = new_scale;
        true
    }

    /// Pans by a delta in pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate_x += dx;
        self.translate_y += dy;
    }

    /// Resets to 1:1 with no pan.
    pub fn reset(&mut self) {
        self.scale = 1.0_f64.clamp(self.min_scale, self.max_scale);
        self.translate_x = 0.0;
        self.translate_y = 0.0;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MIN_SCALE, MAX_SCALE)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Viewport[scale={:.2}x, translate=({:.1}, {:.1})]",
            self.scale, self.translate_x, self.translate_y
        )
    }
}
