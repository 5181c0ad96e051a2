//! Storage service abstraction.

use async_trait::async_trait;
use floorplan_core::{CalibrationLine, Layer, LayerId, Marker, PersistenceError};

/// Result type for backend calls
pub type BackendResult<T> = std::result::Result<T, PersistenceError>;

/// Remote store for markers, layers and calibrations of one floorplan.
///
/// Implementations return the authoritative record after each write so
/// callers can reconcile server-assigned fields directly.
#[async_trait]
pub trait MarkerBackend: Send + Sync {
    /// `GET markers?page=N`
    async fn list_markers(&self, page: u32) -> BackendResult<Vec<Marker>>;

    /// `POST marker`; the body carries no id.
    async fn create_marker(&self, marker: &Marker) -> BackendResult<Marker>;

    /// `PUT marker/{id}`
    async fn update_marker(&self, remote_id: i64, marker: &Marker) -> BackendResult<Marker>;

    /// `DELETE marker/{id}`
    async fn delete_marker(&self, remote_id: i64) -> BackendResult<()>;

    /// `GET calibration?page=N`; `None` when the page is uncalibrated.
    async fn get_calibration(&self, page: u32) -> BackendResult<Option<CalibrationLine>>;

    /// `POST calibration?page=N`; replaces any previous calibration of the page.
    async fn save_calibration(&self, calibration: &CalibrationLine)
        -> BackendResult<CalibrationLine>;

    async fn list_layers(&self) -> BackendResult<Vec<Layer>>;

    /// The layer id in the request is ignored; the response carries the assigned one.
    async fn create_layer(&self, layer: &Layer) -> BackendResult<Layer>;

    async fn update_layer(&self, layer: &Layer) -> BackendResult<Layer>;

    async fn delete_layer(&self, id: LayerId) -> BackendResult<()>;
}
