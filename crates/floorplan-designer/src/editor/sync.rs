//! Folding gateway outcomes back into the editor.
//!
//! Authoritative records returned by the service update the model
//! directly. A page re-fetch is only issued as a fallback after a failed
//! update or delete, and reconciles the page with what the service holds.

use floorplan_core::{AppEvent, LayerEvent, MarkerEvent, MarkerId, PersistenceError};
use floorplan_gateway::{MutationKind, Outcome, Request};

use super::FloorplanEditor;

impl FloorplanEditor {
    /// Applies every outcome that has already arrived. Returns how many.
    pub fn process_outcomes(&mut self) -> usize {
        let mut handled = 0;
        while let Some(outcome) = self.gateway.try_next() {
            self.apply_outcome(outcome);
            handled += 1;
        }
        handled
    }

    pub(crate) fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created { key, marker } => {
                self.store.finish_request(key);
                let page = marker.page;
                let Some(remote_id) = marker.remote_id else {
                    self.marker_failed(
                        key,
                        MutationKind::Create,
                        page,
                        PersistenceError::Decode {
                            reason: "created marker has no id".to_string(),
                        },
                    );
                    return;
                };
                if let Some(pending) = self.deleting.get_mut(&key) {
                    *pending = Some(remote_id);
                }
                if self.store.apply_saved(key, marker) {
                    tracing::debug!("{} stored as #{}", key, remote_id);
                    self.bus
                        .publish(AppEvent::Marker(MarkerEvent::Created { key, remote_id }));
                }
                self.marker_changed(page);
            }
            Outcome::Updated { key, marker } => {
                self.store.finish_request(key);
                let page = marker.page;
                let version = marker.version;
                if self.store.apply_saved(key, marker) {
                    self.bus
                        .publish(AppEvent::Marker(MarkerEvent::Updated { key, version }));
                }
                self.marker_changed(page);
            }
            Outcome::Deleted { key, page } => {
                self.deleting.remove(&key);
                self.bus.publish(AppEvent::Marker(MarkerEvent::Deleted { key }));
                self.marker_changed(page);
            }
            Outcome::MarkerFailed {
                key,
                mutation,
                page,
                error,
            } => {
                if mutation != MutationKind::Delete {
                    self.store.finish_request(key);
                }
                self.marker_failed(key, mutation, page, error);
            }
            Outcome::MarkersLoaded { page, markers } => {
                let markers = markers
                    .into_iter()
                    .filter(|m| {
                        m.remote_id
                            .is_none_or(|id| !self.deleting.values().any(|d| *d == Some(id)))
                    })
                    .collect();
                let dropped = self.store.reconcile_page(page, markers);
                if !dropped.is_empty() {
                    tracing::debug!("{} marker(s) gone from page {}", dropped.len(), page);
                }
                if self.selection.is_some_and(|key| dropped.contains(&key)) {
                    self.selection = None;
                }
            }
            Outcome::CalibrationLoaded { page, calibration } => {
                if self.unsaved_calibrations.contains(&page) {
                    tracing::debug!("keeping local calibration of page {}", page);
                } else {
                    let calibration = calibration.filter(|line| match line.validate() {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!("Ignoring calibration of page {}: {}", page, e);
                            false
                        }
                    });
                    self.calibrations.replace(page, calibration);
                }
            }
            Outcome::CalibrationSaved(line) => {
                self.unsaved_calibrations.remove(&line.page);
                self.calibrations.set(line);
            }
            Outcome::LayersLoaded(layers) => {
                tracing::debug!("{} layer(s) loaded", layers.len());
                self.layers.replace_all(layers);
            }
            Outcome::LayerCreated(layer) => {
                let id = layer.id;
                self.layers.upsert(layer);
                self.bus.publish(AppEvent::Layer(LayerEvent::Created { id }));
            }
            Outcome::LayerUpdated(layer) => {
                let id = layer.id;
                // Deleted locally while the update was in flight.
                if self.layers.get(id).is_none() {
                    return;
                }
                self.layers.upsert(layer);
                self.bus.publish(AppEvent::Layer(LayerEvent::Updated { id }));
            }
            Outcome::LayerDeleted(id) => {
                tracing::debug!("layer {} deleted", id);
            }
            Outcome::RequestFailed { request, error } => {
                tracing::warn!("Failed {}: {}", request, error);
                self.bus
                    .publish(AppEvent::error(format!("Failed {}: {}", request, error)));
                match request {
                    Request::SaveCalibration { page } => {
                        self.unsaved_calibrations.remove(&page);
                    }
                    ref r if r.is_layer_mutation() => self.gateway.fetch_layers(),
                    _ => {}
                }
            }
        }
    }

    fn marker_changed(&mut self, page: u32) {
        self.bus.publish(AppEvent::Marker(MarkerEvent::Changed { page }));
        self.bus
            .publish(AppEvent::Marker(MarkerEvent::EquipmentCountsStale));
    }

    /// A failed create keeps the marker, flagged for [`retry`]. A failed
    /// update or delete re-fetches the page so the model matches the
    /// service again.
    ///
    /// [`retry`]: FloorplanEditor::retry
    fn marker_failed(
        &mut self,
        key: MarkerId,
        mutation: MutationKind,
        page: u32,
        error: PersistenceError,
    ) {
        tracing::error!("Marker {} {} failed: {}", mutation, key, error);
        self.bus.publish(AppEvent::Marker(MarkerEvent::SyncFailed {
            key,
            reason: error.to_string(),
        }));
        self.bus.publish(AppEvent::error(format!(
            "Could not {} marker: {}",
            mutation, error
        )));

        match mutation {
            MutationKind::Create => self.store.mark_failed(&key),
            MutationKind::Update => {
                self.store.mark_failed(&key);
                if !matches!(error, PersistenceError::NotPersisted { .. }) {
                    self.gateway.fetch_markers(page);
                }
            }
            MutationKind::Delete => {
                self.deleting.remove(&key);
                self.gateway.fetch_markers(page);
            }
        }
    }
}
