//! Event type definitions for the event bus.
//!
//! Events are organised by category and are cloneable and serialisable so
//! they can be logged or forwarded to a host UI.

use serde::{Deserialize, Serialize};

use crate::data::{LayerId, MarkerId};

/// Root event enum for all application events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// User-facing notifications (toasts)
    Notification(Notification),
    /// Marker persistence and cache invalidation
    Marker(MarkerEvent),
    /// Layer list changes
    Layer(LayerEvent),
    /// Calibration changes
    Calibration(CalibrationEvent),
    /// Viewport scale/pan/page changes
    Viewport(ViewportEvent),
    /// Document rendering
    Render(RenderEvent),
    /// Page export requests and results
    Export(ExportEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Notification(_) => EventCategory::Notification,
            AppEvent::Marker(_) => EventCategory::Marker,
            AppEvent::Layer(_) => EventCategory::Layer,
            AppEvent::Calibration(_) => EventCategory::Calibration,
            AppEvent::Viewport(_) => EventCategory::Viewport,
            AppEvent::Render(_) => EventCategory::Render,
            AppEvent::Export(_) => EventCategory::Export,
        }
    }

    /// Build an error notification
    pub fn error(message: impl Into<String>) -> Self {
        AppEvent::Notification(Notification::new(NotificationLevel::Error, message))
    }

    /// Build a warning notification
    pub fn warning(message: impl Into<String>) -> Self {
        AppEvent::Notification(Notification::new(NotificationLevel::Warning, message))
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Notification,
    Marker,
    Layer,
    Calibration,
    Viewport,
    Render,
    Export,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Notification => write!(f, "Notification"),
            EventCategory::Marker => write!(f, "Marker"),
            EventCategory::Layer => write!(f, "Layer"),
            EventCategory::Calibration => write!(f, "Calibration"),
            EventCategory::Viewport => write!(f, "Viewport"),
            EventCategory::Render => write!(f, "Render"),
            EventCategory::Export => write!(f, "Export"),
        }
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A non-fatal message for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Marker persistence events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarkerEvent {
    /// A create succeeded and the marker now carries a server id
    Created { key: MarkerId, remote_id: i64 },
    /// An update succeeded
    Updated { key: MarkerId, version: u32 },
    /// A delete succeeded
    Deleted { key: MarkerId },
    /// A mutation failed; the marker keeps its optimistic local value
    SyncFailed { key: MarkerId, reason: String },
    /// The marker list for a page changed and dependent caches must refresh
    Changed { page: u32 },
    /// Equipment count aggregates maintained elsewhere are out of date
    EquipmentCountsStale,
}

/// Layer list events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LayerEvent {
    Created { id: LayerId },
    Updated { id: LayerId },
    Deleted { id: LayerId },
    VisibilityChanged { id: LayerId, visible: bool },
}

/// Calibration events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CalibrationEvent {
    /// A new calibration replaced the previous one for the page
    Replaced { page: u32, scale_factor: f64 },
}

/// Viewport events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ViewportEvent {
    Zoomed { scale: f64 },
    Reset,
    PageChanged { page: u32 },
}

/// Document render events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderEvent {
    /// A page raster is ready for display
    PageReady { page: u32, scale: f64, generation: u64 },
    /// Rendering failed for a reason other than cancellation
    Failed { page: u32, reason: String },
}

/// Export events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExportEvent {
    /// Host asks for the page and its overlay to be flattened to an image
    Requested { page: u32 },
    /// The flattened image was produced
    Completed { page: u32, bytes: usize },
}
