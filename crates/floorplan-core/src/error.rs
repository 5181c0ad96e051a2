//! Error handling for the floorplan engine
//!
//! Provides error types for all layers of the engine:
//! - Render errors (document decoding, page rasterisation, cancellation)
//! - Persistence errors (marker/layer/calibration storage service)
//! - Equipment errors (external equipment-configuration collaborator)
//! - Model errors (marker store, layers, calibration, tool availability)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Render error type
///
/// Represents failures of the document renderer. A cancelled render is
/// reported through this type too, but it is not a failure and callers must
/// check [`RenderError::is_cancellation`] before surfacing it to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A newer render request superseded this one
    #[error("Render cancelled")]
    Cancelled,

    /// The document contains no pages
    #[error("Document contains no pages")]
    EmptyDocument,

    /// The requested page does not exist
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// The requested page index.
        page: u32,
        /// Number of pages in the document.
        page_count: u32,
    },

    /// The document or a page could not be decoded
    #[error("Failed to decode document: {reason}")]
    Decode {
        /// The decoder's reason.
        reason: String,
    },

    /// The requested magnification cannot be rendered
    #[error("Invalid render scale {scale}")]
    InvalidScale {
        /// The rejected scale.
        scale: f64,
    },

    /// Generic render error
    #[error("Render error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

impl RenderError {
    /// True when the render was superseded rather than failed.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RenderError::Cancelled)
    }
}

/// Persistence error type
///
/// Represents failures talking to the external marker/layer/calibration store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The request never reached the service or the connection dropped
    #[error("Transport error: {reason}")]
    Transport {
        /// The reason reported by the transport.
        reason: String,
    },

    /// The service answered with a non-success status
    #[error("Service returned status {status}: {reason}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Body or reason phrase.
        reason: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },

    /// An update or delete was issued for a marker whose create never succeeded
    #[error("Marker {marker} has not been persisted")]
    NotPersisted {
        /// Client key of the marker.
        marker: String,
    },

    /// The addressed record does not exist on the service
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing record.
        resource: String,
    },

    /// Request timed out
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The gateway worker is gone
    #[error("Persistence gateway is shut down")]
    ChannelClosed,
}

/// Equipment collaborator error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquipmentError {
    /// The referenced equipment no longer exists in the equipment store
    #[error("Equipment {equipment_id} not found")]
    NotFound {
        /// The stale equipment identifier.
        equipment_id: i64,
    },

    /// The collaborator could not be reached
    #[error("Equipment service unavailable: {reason}")]
    Unavailable {
        /// The reason the collaborator failed.
        reason: String,
    },
}

/// Model error type
///
/// Represents invalid operations against the in-memory model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No marker with this key exists
    #[error("Unknown marker {id}")]
    UnknownMarker {
        /// The missing marker key.
        id: String,
    },

    /// No layer with this id exists
    #[error("Unknown layer {id}")]
    UnknownLayer {
        /// The missing layer id.
        id: i64,
    },

    /// The calibration line has zero length or the distance is not positive
    #[error("Calibration line is degenerate")]
    DegenerateCalibration,

    /// The tool cannot be used in the current document state
    #[error("Tool {tool} is unavailable: {reason}")]
    ToolUnavailable {
        /// The refused tool.
        tool: String,
        /// Why it is unavailable.
        reason: String,
    },

    /// The page index is outside the document
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// The requested page index.
        page: u32,
        /// Number of pages in the document.
        page_count: u32,
    },
}

/// Main error type for the floorplan engine
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Render error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Persistence error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Equipment collaborator error
    #[error(transparent)]
    Equipment(#[from] EquipmentError),

    /// Model error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a superseded render rather than a real failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Render(e) if e.is_cancellation())
    }

    /// Check if this is a persistence error
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Persistence(PersistenceError::Timeout { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
