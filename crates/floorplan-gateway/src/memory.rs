//! In-process backend.
//!
//! Holds records in memory and logs every call it receives, which makes it
//! the backend of choice for tests and for running the editor offline.

use async_trait::async_trait;
use floorplan_core::{CalibrationLine, Layer, LayerId, Marker, PersistenceError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::backend::{BackendResult, MarkerBackend};

/// A request received by [`InMemoryBackend`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    ListMarkers { page: u32 },
    CreateMarker(Marker),
    UpdateMarker { remote_id: i64, marker: Marker },
    DeleteMarker { remote_id: i64 },
    GetCalibration { page: u32 },
    SaveCalibration(CalibrationLine),
    ListLayers,
    CreateLayer(Layer),
    UpdateLayer(Layer),
    DeleteLayer { id: LayerId },
}

#[derive(Default)]
struct Records {
    markers: BTreeMap<i64, Marker>,
    layers: BTreeMap<LayerId, Layer>,
    calibrations: BTreeMap<u32, CalibrationLine>,
    next_id: i64,
    calls: Vec<BackendCall>,
    failures_left: usize,
}

impl Records {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Records the call, then consumes one injected failure if any are left.
    fn log(&mut self, call: BackendCall) -> BackendResult<()> {
        self.calls.push(call);
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(PersistenceError::Transport {
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Backend that keeps markers, layers and calibrations in memory.
#[derive(Default)]
pub struct InMemoryBackend {
    records: Mutex<Records>,
    create_delay: Mutex<Option<Duration>>,
    reply_delay: Mutex<Option<Duration>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls fail with a transport error.
    pub fn fail_next(&self, count: usize) {
        self.records.lock().failures_left = count;
    }

    /// Slows marker creation down, to exercise request ordering.
    pub fn delay_creates(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    /// Stores created markers at once but holds back the response.
    pub fn delay_create_replies(&self, delay: Duration) {
        *self.reply_delay.lock() = Some(delay);
    }

    /// Stores a calibration directly, bypassing the call log.
    pub fn seed_calibration(&self, calibration: CalibrationLine) {
        self.records
            .lock()
            .calibrations
            .insert(calibration.page, calibration);
    }

    /// Stores a marker directly, bypassing the call log. Returns the stored record.
    pub fn seed_marker(&self, marker: Marker) -> Marker {
        let mut records = self.records.lock();
        let mut stored = marker;
        let id = records.assign_id();
        stored.remote_id = Some(id);
        records.markers.insert(id, stored.clone());
        stored
    }

    /// Stores a layer directly, keeping its id.
    pub fn seed_layer(&self, layer: Layer) {
        let mut records = self.records.lock();
        records.next_id = records.next_id.max(layer.id);
        records.layers.insert(layer.id, layer);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.records.lock().calls.clone()
    }

    /// Marker creations received so far.
    pub fn creates(&self) -> Vec<Marker> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::CreateMarker(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Marker updates received so far, as `(remote_id, marker)`.
    pub fn updates(&self) -> Vec<(i64, Marker)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::UpdateMarker { remote_id, marker } => Some((remote_id, marker)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::DeleteMarker { remote_id } => Some(remote_id),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.records.lock().calls.clear();
    }

    pub fn stored_marker(&self, remote_id: i64) -> Option<Marker> {
        self.records.lock().markers.get(&remote_id).cloned()
    }

    pub fn marker_count(&self) -> usize {
        self.records.lock().markers.len()
    }

    pub fn stored_calibration(&self, page: u32) -> Option<CalibrationLine> {
        self.records.lock().calibrations.get(&page).cloned()
    }

    pub fn stored_layers(&self) -> Vec<Layer> {
        self.records.lock().layers.values().cloned().collect()
    }
}

#[async_trait]
impl MarkerBackend for InMemoryBackend {
    async fn list_markers(&self, page: u32) -> BackendResult<Vec<Marker>> {
        let mut records = self.records.lock();
        records.log(BackendCall::ListMarkers { page })?;
        Ok(records
            .markers
            .values()
            .filter(|m| m.page == page)
            .cloned()
            .collect())
    }

    async fn create_marker(&self, marker: &Marker) -> BackendResult<Marker> {
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let stored = {
            let mut records = self.records.lock();
            records.log(BackendCall::CreateMarker(marker.clone()))?;
            let id = records.assign_id();
            let mut stored = marker.clone();
            stored.remote_id = Some(id);
            stored.version = 1;
            records.markers.insert(id, stored.clone());
            drop(records);
            stored
        };

        let delay = *self.reply_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(stored)
    }

    async fn update_marker(&self, remote_id: i64, marker: &Marker) -> BackendResult<Marker> {
        let mut records = self.records.lock();
        records.log(BackendCall::UpdateMarker {
            remote_id,
            marker: marker.clone(),
        })?;
        let previous = records
            .markers
            .get(&remote_id)
            .map(|m| m.version)
            .ok_or_else(|| PersistenceError::NotFound {
                resource: format!("marker {}", remote_id),
            })?;
        let mut stored = marker.clone();
        stored.remote_id = Some(remote_id);
        stored.version = previous + 1;
        records.markers.insert(remote_id, stored.clone());
        Ok(stored)
    }

    async fn delete_marker(&self, remote_id: i64) -> BackendResult<()> {
        let mut records = self.records.lock();
        records.log(BackendCall::DeleteMarker { remote_id })?;
        records
            .markers
            .remove(&remote_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound {
                resource: format!("marker {}", remote_id),
            })
    }

    async fn get_calibration(&self, page: u32) -> BackendResult<Option<CalibrationLine>> {
        let mut records = self.records.lock();
        records.log(BackendCall::GetCalibration { page })?;
        Ok(records.calibrations.get(&page).cloned())
    }

    async fn save_calibration(
        &self,
        calibration: &CalibrationLine,
    ) -> BackendResult<CalibrationLine> {
        let mut records = self.records.lock();
        records.log(BackendCall::SaveCalibration(calibration.clone()))?;
        records
            .calibrations
            .insert(calibration.page, calibration.clone());
        Ok(calibration.clone())
    }

    async fn list_layers(&self) -> BackendResult<Vec<Layer>> {
        let mut records = self.records.lock();
        records.log(BackendCall::ListLayers)?;
        let mut layers: Vec<Layer> = records.layers.values().cloned().collect();
        layers.sort_by_key(|l| l.order_index);
        Ok(layers)
    }

    async fn create_layer(&self, layer: &Layer) -> BackendResult<Layer> {
        let mut records = self.records.lock();
        records.log(BackendCall::CreateLayer(layer.clone()))?;
        let mut stored = layer.clone();
        stored.id = records.assign_id();
        records.layers.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_layer(&self, layer: &Layer) -> BackendResult<Layer> {
        let mut records = self.records.lock();
        records.log(BackendCall::UpdateLayer(layer.clone()))?;
        if !records.layers.contains_key(&layer.id) {
            return Err(PersistenceError::NotFound {
                resource: format!("layer {}", layer.id),
            });
        }
        records.layers.insert(layer.id, layer.clone());
        Ok(layer.clone())
    }

    async fn delete_layer(&self, id: LayerId) -> BackendResult<()> {
        let mut records = self.records.lock();
        records.log(BackendCall::DeleteLayer { id })?;
        records.layers.remove(&id);
        Ok(())
    }
}
