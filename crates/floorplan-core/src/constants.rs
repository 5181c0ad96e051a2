//! Engine-wide defaults.
//!
//! Values used when no configuration overrides them.

/// Smallest allowed viewport scale (document -> pixel).
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed viewport scale (document -> pixel).
pub const MAX_SCALE: f64 = 10.0;

/// Multiplicative zoom applied per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Minimum on-screen size, in viewport pixels, for a drag-sized shape to be kept.
pub const MIN_SHAPE_PX: f64 = 5.0;

/// Minimum on-screen spacing, in viewport pixels, between consecutive polyline vertices.
pub const VERTEX_SPACING_PX: f64 = 3.0;

/// Hit-test tolerance around markers, in viewport pixels.
pub const HIT_TOLERANCE_PX: f64 = 6.0;

/// Side length of a resize handle, in viewport pixels.
pub const HANDLE_SIZE_PX: f64 = 8.0;

/// Radius of the hit area of pin-like markers (equipment, notes, text), in viewport pixels.
pub const PIN_RADIUS_PX: f64 = 10.0;

/// Document-space offset applied to duplicated markers.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Default marker stroke colour (hex RGB).
pub const DEFAULT_STROKE_COLOR: &str = "#1e88e5";

/// Default marker fill colour (hex RGB).
pub const DEFAULT_FILL_COLOR: &str = "#90caf9";

/// Default marker opacity.
pub const DEFAULT_OPACITY: f32 = 0.6;

/// Default marker stroke width in document units.
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// Initial content of a freshly placed note.
pub const DEFAULT_NOTE_TEXT: &str = "New note";

/// Initial content of a freshly placed text label.
pub const DEFAULT_LABEL_TEXT: &str = "Text";
