//! # Floorplan Designer
//!
//! The interactive part of the floorplan annotation engine: a paged
//! document on screen, typed markers placed on top of it, and everything
//! needed to keep the two in step.
//!
//! ## Core Components
//!
//! - **Viewport**: document/viewport/screen transforms, zoom toward a point, pan
//! - **Document**: single images or ZIP archives of page images, rendered
//!   off the interaction loop with supersession
//! - **Markers**: keyed store with per-marker sync tracking
//! - **Layers**: visibility filtering and style inheritance
//! - **Calibration**: per-page real-world scale and measurements
//! - **Editor**: the tool-mode state machine driving all of the above
//! - **Overlay**: tiny-skia marker rendering and page flattening for export
//!
//! ## Architecture
//!
//! ```text
//! FloorplanEditor (input -> interaction state machine)
//!   ├── Viewport (screen <-> document)
//!   ├── MarkerStore / LayerSet / CalibrationRegistry (model)
//!   ├── RenderScheduler -> Document (pages)
//!   └── PersistenceGateway (floorplan-gateway)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floorplan_designer::{FloorplanEditor, PointerButton, Tool};
//!
//! let mut editor = FloorplanEditor::new(&config, backend, bus);
//! editor.set_tool(Tool::Rectangle)?;
//! editor.pointer_down(10.0, 10.0, PointerButton::Primary);
//! editor.pointer_move(60.0, 40.0);
//! editor.pointer_up(60.0, 40.0, PointerButton::Primary);
//! editor.settle().await;
//! ```

pub mod calibration;
pub mod document;
pub mod editor;
pub mod equipment;
pub mod geometry;
pub mod layers;
pub mod overlay;
pub mod render;
pub mod store;
pub mod viewport;

pub use calibration::{CalibrationRegistry, Measurement};
pub use document::{Document, RenderToken, RenderedPage};
pub use editor::{
    DocumentState, EditorResponse, FloorplanEditor, Interaction, Key, Modifiers, PointerButton,
    Tool,
};
pub use equipment::{configure_equipment, EquipmentChoice, EquipmentConfigurator, EquipmentRequest};
pub use geometry::HitTolerance;
pub use layers::{LayerSet, ResolvedStyle};
pub use overlay::{encode_png, flatten_page, OverlayRenderer};
pub use render::RenderScheduler;
pub use store::MarkerStore;
pub use viewport::Viewport;
