//! The floorplan editor.
//!
//! [`FloorplanEditor`] ties the viewport, marker store, layers, calibrations,
//! renderer and persistence gateway together and runs the tool-mode state
//! machine. Input handlers run synchronously to completion; persistence and
//! rendering happen in the background and are folded back in by
//! [`FloorplanEditor::process_outcomes`] or [`FloorplanEditor::settle`].
//!
//! Every model change is applied locally first and then queued on the
//! gateway. Server responses reconcile server-assigned fields.

mod input;
mod interaction;
mod layer_ops;
mod sync;
mod tool;

pub use interaction::{DocumentState, EditorResponse, Interaction};
pub use tool::{Key, Modifiers, PointerButton, Tool};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use floorplan_core::{
    AppEvent, CalibrationEvent, CalibrationLine, Error, EventBus, ExportEvent, LayerId,
    LengthUnit, Marker, MarkerId, MarkerKind, ModelError, Point, RenderError, SyncState,
    ViewportEvent,
};
use floorplan_gateway::{MarkerBackend, PersistenceGateway};
use floorplan_settings::{Config, InteractionSettings, StyleSettings};
use tokio::sync::broadcast;

use crate::calibration::{CalibrationRegistry, Measurement};
use crate::document::{Document, RenderToken, RenderedPage};
use crate::equipment::{configure_equipment, EquipmentChoice, EquipmentConfigurator, EquipmentRequest};
use crate::geometry::HitTolerance;
use crate::layers::LayerSet;
use crate::overlay;
use crate::render::RenderScheduler;
use crate::store::MarkerStore;
use crate::viewport::Viewport;

/// Interactive annotation engine for one floorplan.
pub struct FloorplanEditor {
    viewport: Viewport,
    store: MarkerStore,
    layers: LayerSet,
    calibrations: CalibrationRegistry,
    tool: Tool,
    interaction: Interaction,
    selection: Option<MarkerId>,
    page: u32,
    document: DocumentState,
    renderer: Option<RenderScheduler>,
    rendered: Option<RenderedPage>,
    gateway: PersistenceGateway,
    bus: Arc<EventBus>,
    events: broadcast::Receiver<AppEvent>,
    interaction_settings: InteractionSettings,
    style: StyleSettings,
    wheel_zoom_step: f64,
    project_id: i64,
    active_layer: Option<LayerId>,
    pending_equipment: Option<(u32, EquipmentRequest)>,
    pending_calibration: Option<(u32, Point, Point)>,
    measurement: Option<Measurement>,
    /// Deletes in flight, with the server id once known.
    deleting: HashMap<MarkerId, Option<i64>>,
    /// Pages whose local calibration has not been confirmed by the server.
    unsaved_calibrations: HashSet<u32>,
}

impl FloorplanEditor {
    pub fn new(config: &Config, backend: Arc<dyn MarkerBackend>, bus: Arc<EventBus>) -> Self {
        let timeout = Duration::from_millis(config.persistence.timeout_ms);
        Self {
            viewport: Viewport::new(config.viewport.min_scale, config.viewport.max_scale),
            store: MarkerStore::new(),
            layers: LayerSet::new(),
            calibrations: CalibrationRegistry::new(),
            tool: Tool::Select,
            interaction: Interaction::Idle,
            selection: None,
            page: 0,
            document: DocumentState::NotLoaded,
            renderer: None,
            rendered: None,
            gateway: PersistenceGateway::new(backend, timeout),
            events: bus.receiver(),
            bus,
            interaction_settings: config.interaction.clone(),
            style: config.style.clone(),
            wheel_zoom_step: config.viewport.wheel_zoom_step,
            project_id: config.persistence.project_id,
            active_layer: None,
            pending_equipment: None,
            pending_calibration: None,
            measurement: None,
            deleting: HashMap::new(),
            unsaved_calibrations: HashSet::new(),
        }
    }

    /// Loads layers plus the markers and calibration of the current page.
    pub fn open(&mut self) {
        tracing::info!("Opening floorplan at page {}", self.page);
        self.gateway.fetch_layers();
        self.gateway.fetch_markers(self.page);
        self.gateway.fetch_calibration(self.page);
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn calibrations(&self) -> &CalibrationRegistry {
        &self.calibrations
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn selection(&self) -> Option<MarkerId> {
        self.selection
    }

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.selection.and_then(|key| self.store.get(&key))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn document_state(&self) -> &DocumentState {
        &self.document
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.active_layer
    }

    /// Layer assigned to newly placed markers.
    pub fn set_active_layer(&mut self, layer: Option<LayerId>) {
        self.active_layer = layer;
    }

    /// Marker being created by the current gesture.
    pub fn preview(&self) -> Option<&Marker> {
        self.interaction.preview()
    }

    /// Active or last completed measurement.
    pub fn measurement(&self) -> Option<Measurement> {
        match self.interaction {
            Interaction::Measuring { start, end } => {
                Some(self.calibrations.measure(self.page, start, end))
            }
            _ => self.measurement,
        }
    }

    /// Markers of the current page that are drawn and can be interacted with.
    pub fn visible_markers(&self) -> Vec<&Marker> {
        self.store
            .on_page(self.page)
            .filter(|m| self.layers.is_marker_visible(m))
            .collect()
    }

    /// Topmost visible marker under `p`.
    pub fn marker_at(&self, p: Point) -> Option<MarkerId> {
        let tolerance = self.tolerance();
        self.store
            .on_page(self.page)
            .rev()
            .filter(|m| self.layers.is_marker_visible(m))
            .find(|m| crate::geometry::hit_test(m, p, &tolerance))
            .map(|m| m.key)
    }

    fn tolerance(&self) -> HitTolerance {
        HitTolerance::from_pixels(
            self.interaction_settings.hit_tolerance_px,
            self.interaction_settings.pin_radius_px,
            self.interaction_settings.handle_size_px,
            self.viewport.scale(),
        )
    }

    /// Switches tool mode, discarding any gesture in progress.
    pub fn set_tool(&mut self, tool: Tool) -> Result<(), ModelError> {
        if tool.places_markers() {
            if let DocumentState::Failed { reason } = &self.document {
                return Err(ModelError::ToolUnavailable {
                    tool: tool.to_string(),
                    reason: reason.clone(),
                });
            }
        }
        if tool != self.tool {
            tracing::debug!("tool {} -> {}", self.tool, tool);
        }
        self.cancel_gesture();
        self.pending_equipment = None;
        self.pending_calibration = None;
        self.measurement = None;
        self.tool = tool;
        Ok(())
    }

    /// Abandons the gesture in progress. A dragged or resized marker goes
    /// back to its geometry from before the gesture; nothing is persisted.
    pub fn cancel_gesture(&mut self) -> bool {
        let interaction = std::mem::take(&mut self.interaction);
        self.store.release();
        match interaction {
            Interaction::Idle => false,
            Interaction::Dragging { key, original, .. }
            | Interaction::Resizing { key, original, .. } => {
                self.restore(key, original);
                true
            }
            other => {
                tracing::debug!("cancelled {}", other.name());
                true
            }
        }
    }

    fn restore(&mut self, key: MarkerId, mut original: Marker) {
        if let Some(current) = self.store.get(&key) {
            original.remote_id = current.remote_id.or(original.remote_id);
            original.version = current.version.max(original.version);
            original.sync = current.sync;
            self.store.insert(original);
        }
    }

    /// Navigates to `page` and loads its markers and calibration.
    pub fn set_page(&mut self, page: u32) -> Result<(), ModelError> {
        if let DocumentState::Loaded { page_count } = self.document {
            if page >= page_count {
                return Err(ModelError::PageOutOfRange { page, page_count });
            }
        }
        self.cancel_gesture();
        self.selection = None;
        self.measurement = None;
        self.pending_equipment = None;
        self.pending_calibration = None;
        self.page = page;
        self.rendered = None;
        tracing::info!("Showing page {}", page);

        self.gateway.fetch_markers(page);
        self.gateway.fetch_calibration(page);
        self.bus
            .publish(AppEvent::Viewport(ViewportEvent::PageChanged { page }));
        self.request_render();
        Ok(())
    }

    /// Loads a floorplan document from raw bytes.
    ///
    /// On failure the editor stays usable for navigation and layers, but
    /// placement tools are refused.
    pub fn load_document(&mut self, bytes: &[u8]) -> Result<u32, RenderError> {
        match Document::from_bytes(bytes) {
            Ok(document) => {
                let page_count = document.page_count();
                self.document = DocumentState::Loaded { page_count };
                self.renderer = Some(RenderScheduler::new(Arc::new(document), self.bus.clone()));
                let page = if self.page < page_count { self.page } else { 0 };
                // The page is in range, so this cannot fail.
                let _ = self.set_page(page);
                Ok(page_count)
            }
            Err(e) => {
                tracing::error!("Failed to load floorplan document: {}", e);
                self.document = DocumentState::Failed {
                    reason: e.to_string(),
                };
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.cancel();
                }
                self.renderer = None;
                self.rendered = None;
                if self.tool.places_markers() {
                    self.cancel_gesture();
                    self.tool = Tool::Select;
                }
                self.bus
                    .publish(AppEvent::error(format!("Could not load floorplan: {}", e)));
                Err(e)
            }
        }
    }

    /// Renders the current page at the current scale, superseding any
    /// render still running.
    pub fn request_render(&mut self) -> Option<RenderToken> {
        let scale = self.viewport.scale();
        let page = self.page;
        self.renderer
            .as_mut()
            .map(|renderer| renderer.request(page, scale))
    }

    /// Picks up finished renders; returns the page currently on display.
    pub fn poll_render(&mut self) -> Option<&RenderedPage> {
        if let Some(rendered) = self.renderer.as_mut().and_then(|r| r.poll()) {
            if rendered.page == self.page {
                self.rendered = Some(rendered);
            }
        }
        self.rendered.as_ref()
    }

    pub fn rendered_page(&self) -> Option<&RenderedPage> {
        self.rendered.as_ref()
    }

    /// Waits until every persistence request and render has finished and
    /// folds the results in.
    pub async fn settle(&mut self) {
        while let Some(outcome) = self.gateway.next().await {
            self.apply_outcome(outcome);
        }
        if let Some(renderer) = self.renderer.as_mut() {
            if let Some(rendered) = renderer.settle().await {
                if rendered.page == self.page {
                    self.rendered = Some(rendered);
                }
            }
        }
    }

    pub(crate) fn zoom_at(&mut self, factor: f64, screen_x: f64, screen_y: f64) -> bool {
        if !self.viewport.zoom(factor, screen_x, screen_y) {
            return false;
        }
        self.bus.publish(AppEvent::Viewport(ViewportEvent::Zoomed {
            scale: self.viewport.scale(),
        }));
        self.request_render();
        true
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
        self.bus.publish(AppEvent::Viewport(ViewportEvent::Reset));
        self.request_render();
    }

    fn new_marker(&self, kind: MarkerKind, at: Point) -> Marker {
        let mut marker = Marker::new(self.page, kind, at);
        marker.layer_id = self.active_layer;
        marker
    }

    pub(crate) fn persist_create(&mut self, marker: Marker) -> MarkerId {
        let key = marker.key;
        tracing::info!("Placing {} {} on page {}", marker.kind, key, marker.page);
        self.store.insert(marker.clone());
        self.store.begin_request(key);
        self.gateway.create(marker);
        key
    }

    pub(crate) fn persist_update(&mut self, key: MarkerId) {
        self.store.begin_request(key);
        if let Some(marker) = self.store.get(&key) {
            self.gateway.update(marker.clone());
        }
    }

    /// Deletes a marker locally and queues the delete.
    pub fn delete_marker(&mut self, key: MarkerId) -> Result<(), ModelError> {
        if self.interaction.target() == Some(key) {
            self.cancel_gesture();
        }
        let marker = self.store.remove(&key).ok_or(ModelError::UnknownMarker {
            id: key.to_string(),
        })?;
        if self.selection == Some(key) {
            self.selection = None;
        }
        tracing::info!("Deleting {} {}", marker.kind, key);
        self.deleting.insert(key, marker.remote_id);
        self.gateway.delete(key, marker.page, marker.remote_id);
        Ok(())
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Some(key) => self.delete_marker(key).is_ok(),
            None => false,
        }
    }

    /// Copies the selected marker with a fixed offset and selects the copy.
    pub fn duplicate_selected(&mut self) -> Option<MarkerId> {
        let offset = self.interaction_settings.duplicate_offset;
        let copy = self.selected_marker()?.duplicate(offset, offset);
        let key = self.persist_create(copy);
        self.selection = Some(key);
        Some(key)
    }

    /// Re-submits a marker whose last request failed.
    pub fn retry(&mut self, key: MarkerId) -> Result<(), ModelError> {
        let marker = self.store.get(&key).ok_or(ModelError::UnknownMarker {
            id: key.to_string(),
        })?;
        if marker.sync != SyncState::Failed {
            return Ok(());
        }
        tracing::info!("Retrying {}", key);
        if marker.remote_id.is_some() {
            self.persist_update(key);
        } else {
            let marker = marker.clone();
            self.store.begin_request(key);
            self.gateway.create(marker);
        }
        Ok(())
    }

    /// Replaces the text of a note or label.
    pub fn set_text(&mut self, key: MarkerId, text: impl Into<String>) -> Result<(), ModelError> {
        let marker = self.store.get_mut(&key).ok_or(ModelError::UnknownMarker {
            id: key.to_string(),
        })?;
        marker.text_content = Some(text.into());
        self.persist_update(key);
        Ok(())
    }

    /// Finishes an equipment placement or reconfiguration with the
    /// collaborator's answer. Returns the affected marker.
    pub fn complete_equipment(&mut self, choice: EquipmentChoice) -> Option<MarkerId> {
        let (page, request) = self.pending_equipment.take()?;
        let EquipmentChoice::Selected {
            equipment_id,
            label,
        } = choice
        else {
            tracing::debug!("equipment placement cancelled");
            return None;
        };

        match request.marker {
            Some(key) => {
                let marker = self.store.get_mut(&key)?;
                marker.equipment_id = Some(equipment_id);
                marker.label = Some(label);
                self.persist_update(key);
                Some(key)
            }
            None => {
                let mut marker = Marker::new(page, request.kind, request.position);
                marker.layer_id = self.active_layer;
                marker.equipment_id = Some(equipment_id);
                marker.label = Some(label);
                let key = self.persist_create(marker);
                self.selection = Some(key);
                Some(key)
            }
        }
    }

    /// Runs the pending equipment request through `configurator` and
    /// completes it.
    pub async fn resolve_equipment(
        &mut self,
        configurator: &dyn EquipmentConfigurator,
    ) -> Option<MarkerId> {
        let request = self.pending_equipment.as_ref()?.1.clone();
        let choice = configure_equipment(configurator, request, &self.bus).await;
        self.complete_equipment(choice)
    }

    /// Equipment request awaiting the collaborator.
    pub fn pending_equipment(&self) -> Option<&EquipmentRequest> {
        self.pending_equipment.as_ref().map(|(_, request)| request)
    }

    /// Reopens the equipment form for an existing pin.
    pub fn reconfigure_equipment(&mut self, key: MarkerId) -> Result<EditorResponse, ModelError> {
        let marker = self.store.get(&key).ok_or(ModelError::UnknownMarker {
            id: key.to_string(),
        })?;
        if !marker.kind.is_equipment() {
            return Err(ModelError::ToolUnavailable {
                tool: marker.kind.to_string(),
                reason: "not an equipment marker".to_string(),
            });
        }
        let request = EquipmentRequest {
            kind: marker.kind,
            project_id: self.project_id,
            position: marker.anchor(),
            existing_equipment_id: marker.equipment_id,
            marker: Some(key),
        };
        self.pending_equipment = Some((marker.page, request.clone()));
        Ok(EditorResponse::RequestEquipment(request))
    }

    /// Finishes a calibration with the real length of the drawn line.
    /// Returns the new scale factor.
    pub fn complete_calibration(
        &mut self,
        real_world_distance: f64,
        unit: LengthUnit,
    ) -> Result<f64, ModelError> {
        let (page, start, end) = self
            .pending_calibration
            .ok_or(ModelError::DegenerateCalibration)?;
        let line = CalibrationLine::new(page, start, end, real_world_distance, unit)?;
        self.pending_calibration = None;
        Ok(self.apply_calibration(line))
    }

    /// Installs `line` as the calibration of its page and persists it.
    pub fn apply_calibration(&mut self, line: CalibrationLine) -> f64 {
        let scale_factor = line.scale_factor();
        let page = line.page;
        tracing::info!(
            "Calibrated page {}: {:.4} {} per unit",
            page,
            scale_factor,
            line.unit
        );
        self.calibrations.set(line.clone());
        self.unsaved_calibrations.insert(page);
        self.gateway.save_calibration(line);
        self.bus
            .publish(AppEvent::Calibration(CalibrationEvent::Replaced {
                page,
                scale_factor,
            }));
        scale_factor
    }

    pub fn cancel_calibration(&mut self) {
        self.pending_calibration = None;
    }

    /// Flattens `page` and its visible markers into a PNG.
    pub fn export_page(&self, page: u32, scale: f64) -> Result<Vec<u8>, Error> {
        let renderer = self.renderer.as_ref().ok_or_else(|| match &self.document {
            DocumentState::Failed { reason } => Error::other(format!("no document: {}", reason)),
            _ => Error::other("no document loaded"),
        })?;
        let markers: Vec<Marker> = self.store.on_page(page).cloned().collect();
        let image = overlay::flatten_page(
            renderer.document(),
            page,
            scale,
            &markers,
            &self.layers,
            &self.style,
        )?;
        Ok(overlay::encode_png(image)?)
    }

    /// Serves `ExportEvent::Requested` events published on the bus since
    /// the last call. Returns the PNG of each request that succeeded.
    pub fn handle_export_requests(&mut self) -> Vec<(u32, Vec<u8>)> {
        let mut exported = Vec::new();
        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("missed {} events", skipped);
                    continue;
                }
                Err(_) => break,
            };
            let AppEvent::Export(ExportEvent::Requested { page }) = event else {
                continue;
            };
            match self.export_page(page, 1.0) {
                Ok(bytes) => {
                    tracing::info!("Exported page {} ({} bytes)", page, bytes.len());
                    self.bus.publish(AppEvent::Export(ExportEvent::Completed {
                        page,
                        bytes: bytes.len(),
                    }));
                    exported.push((page, bytes));
                }
                Err(e) => {
                    tracing::error!("Export of page {} failed: {}", page, e);
                    self.bus.publish(AppEvent::error(format!(
                        "Could not export page {}: {}",
                        page + 1,
                        e
                    )));
                }
            }
        }
        exported
    }
}

impl std::fmt::Debug for FloorplanEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorplanEditor")
            .field("page", &self.page)
            .field("tool", &self.tool)
            .field("interaction", &self.interaction.name())
            .field("markers", &self.store.len())
            .field("viewport", &self.viewport)
            .field("in_flight", &self.gateway.in_flight())
            .finish()
    }
}
