//! # Floorplan
//!
//! Annotation engine for security-system floorplans. A floorplan document
//! (a raster image, or an archive of page images) is shown through a
//! pan/zoom viewport, and users place typed markers on it: shapes, notes,
//! text labels and equipment pins for access points, cameras, elevators and
//! intercoms.
//!
//! ## Architecture
//!
//! The engine is organized as a workspace with multiple crates:
//!
//! 1. **floorplan-core** - Data model, errors, length units, event bus
//! 2. **floorplan-gateway** - Ordered persistence of markers, layers and calibration
//! 3. **floorplan-designer** - Viewport, tool modes, layers, calibration, rendering, export
//! 4. **floorplan-settings** - Configuration load/save and validation
//! 5. **floorplan** - This crate and the `floorplan` command line tool
//!
//! ## Features
//!
//! - **Optimistic editing**: markers appear immediately and reconcile with the service
//! - **Calibration**: per-page scale from a reference line, in ft/in/m/cm/mm
//! - **Layers**: visibility, colour and ordering per layer
//! - **Export**: flatten a page and its visible markers into a PNG

pub use floorplan_core as core;
pub use floorplan_designer as designer;
pub use floorplan_gateway as gateway;
pub use floorplan_settings as settings;

pub use floorplan_core::{
    AppEvent, CalibrationLine, Error, EventBus, Layer, LayerId, LengthUnit, Marker, MarkerId,
    MarkerKind, MarkerStyle, Notification, NotificationLevel, Point, Result, SyncState,
};

pub use floorplan_designer::{
    Document, EditorResponse, EquipmentChoice, EquipmentConfigurator, EquipmentRequest,
    FloorplanEditor, Key, LayerSet, Measurement, Modifiers, PointerButton, Tool, Viewport,
};

pub use floorplan_gateway::{HttpBackend, InMemoryBackend, MarkerBackend, PersistenceGateway};

pub use floorplan_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Logs go to stderr so that command output on stdout stays clean.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
