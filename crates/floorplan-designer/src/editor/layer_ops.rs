//! Layer panel operations.
//!
//! Edits apply to the local list immediately and are persisted through the
//! gateway. New layers only appear once the service has assigned their id.

use floorplan_core::{AppEvent, Layer, LayerEvent, LayerId, ModelError};

use super::FloorplanEditor;

impl FloorplanEditor {
    pub fn create_layer(&mut self, name: impl Into<String>, color: impl Into<String>) {
        let mut layer = Layer::new(0, name, color);
        layer.order_index = self.layers.next_order_index();
        tracing::info!("Creating layer '{}'", layer.name);
        self.gateway.create_layer(layer);
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> Result<(), ModelError> {
        let layer = self.layers.rename(id, name)?.clone();
        self.gateway.update_layer(layer);
        self.bus.publish(AppEvent::Layer(LayerEvent::Updated { id }));
        Ok(())
    }

    pub fn recolor_layer(&mut self, id: LayerId, color: impl Into<String>) -> Result<(), ModelError> {
        let layer = self.layers.recolor(id, color)?.clone();
        self.gateway.update_layer(layer);
        self.bus.publish(AppEvent::Layer(LayerEvent::Updated { id }));
        Ok(())
    }

    /// Shows or hides a layer. Hidden markers are neither drawn nor
    /// interactive, so a hidden selection is dropped.
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), ModelError> {
        let layer = self.layers.set_visible(id, visible)?.clone();
        if !visible {
            if let Some(target) = self.interaction.target() {
                if self.store.get(&target).and_then(|m| m.layer_id) == Some(id) {
                    self.cancel_gesture();
                }
            }
            if self.selected_marker().and_then(|m| m.layer_id) == Some(id) {
                self.selection = None;
            }
        }
        tracing::debug!("layer {} visible={}", id, visible);
        self.gateway.update_layer(layer);
        self.bus
            .publish(AppEvent::Layer(LayerEvent::VisibilityChanged { id, visible }));
        Ok(())
    }

    /// Deletes a layer. Its markers stay and render with default styling.
    pub fn delete_layer(&mut self, id: LayerId) -> Result<(), ModelError> {
        let layer = self.layers.remove(id)?;
        tracing::info!("Deleting layer '{}'", layer.name);
        if self.active_layer == Some(id) {
            self.active_layer = None;
        }
        self.gateway.delete_layer(id);
        self.bus.publish(AppEvent::Layer(LayerEvent::Deleted { id }));
        Ok(())
    }

    /// Moves a layer to `index` in the list and persists every layer whose
    /// order changed.
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> Result<(), ModelError> {
        let changed = self.layers.move_to(id, index)?;
        for layer in changed {
            let id = layer.id;
            self.gateway.update_layer(layer);
            self.bus.publish(AppEvent::Layer(LayerEvent::Updated { id }));
        }
        Ok(())
    }
}
