//! # Floorplan Core
//!
//! Core types, errors and events for the floorplan annotation engine.
//! Provides the document-space data model (markers, layers, calibration
//! lines), the error taxonomy shared by every crate, real-world length
//! units, and the application event bus used for notifications.

pub mod constants;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod units;

pub use data::{
    CalibrationLine, Layer, LayerId, Marker, MarkerId, MarkerKind, MarkerStyle, Point, SyncState,
};

pub use error::{
    EquipmentError, Error, ModelError, PersistenceError, RenderError, Result,
};

// Re-export event bus for convenience
pub use event_bus::{
    AppEvent, CalibrationEvent, EventBus, EventBusConfig, EventCategory, EventFilter,
    ExportEvent, LayerEvent, MarkerEvent, Notification, NotificationLevel, RenderEvent,
    SubscriptionId, ViewportEvent,
};

pub use units::LengthUnit;
