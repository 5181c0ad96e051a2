//! Layer list, visibility filtering and style resolution.

use floorplan_core::{Layer, LayerId, Marker, ModelError};
use floorplan_settings::StyleSettings;

/// Fully resolved drawing style of a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub stroke_color: String,
    pub fill_color: String,
    pub opacity: f32,
    pub stroke_width: f32,
}

/// Ordered layer list of a floorplan.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    layers: Vec<Layer>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers in `order_index` order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut Layer, ModelError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer { id })
    }

    /// Replaces the whole list, e.g. after a fetch.
    pub fn replace_all(&mut self, mut layers: Vec<Layer>) {
        layers.sort_by_key(|l| l.order_index);
        self.layers = layers;
    }

    /// Inserts a layer or replaces the one with the same id.
    pub fn upsert(&mut self, layer: Layer) {
        match self.layers.iter_mut().find(|l| l.id == layer.id) {
            Some(existing) => *existing = layer,
            None => self.layers.push(layer),
        }
        self.layers.sort_by_key(|l| l.order_index);
    }

    /// Next free `order_index` for a new layer.
    pub fn next_order_index(&self) -> i32 {
        self.layers
            .iter()
            .map(|l| l.order_index + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> Result<&Layer, ModelError> {
        let layer = self.get_mut(id)?;
        layer.name = name.into();
        Ok(layer)
    }

    pub fn recolor(&mut self, id: LayerId, color: impl Into<String>) -> Result<&Layer, ModelError> {
        let layer = self.get_mut(id)?;
        layer.color = color.into();
        Ok(layer)
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<&Layer, ModelError> {
        let layer = self.get_mut(id)?;
        layer.visible = visible;
        Ok(layer)
    }

    pub fn remove(&mut self, id: LayerId) -> Result<Layer, ModelError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer { id })?;
        Ok(self.layers.remove(index))
    }

    /// Moves a layer to `index` and rewrites every `order_index` densely.
    /// Returns the layers whose index changed.
    pub fn move_to(&mut self, id: LayerId, index: usize) -> Result<Vec<Layer>, ModelError> {
        let layer = self.remove(id)?;
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);

        let mut changed = Vec::new();
        for (i, layer) in self.layers.iter_mut().enumerate() {
            if layer.order_index != i as i32 {
                layer.order_index = i as i32;
                changed.push(layer.clone());
            }
        }
        Ok(changed)
    }

    /// Markers without a layer, or whose layer no longer exists, are visible.
    pub fn is_marker_visible(&self, marker: &Marker) -> bool {
        match marker.layer_id {
            Some(id) => self.get(id).is_none_or(|l| l.visible),
            None => true,
        }
    }

    /// Marker overrides first, then the layer colour, then the defaults.
    pub fn resolve_style(&self, marker: &Marker, defaults: &StyleSettings) -> ResolvedStyle {
        let layer_color = marker
            .layer_id
            .and_then(|id| self.get(id))
            .map(|l| l.color.clone());
        ResolvedStyle {
            stroke_color: marker
                .style
                .stroke_color
                .clone()
                .or_else(|| layer_color.clone())
                .unwrap_or_else(|| defaults.stroke_color.clone()),
            fill_color: marker
                .style
                .fill_color
                .clone()
                .or(layer_color)
                .unwrap_or_else(|| defaults.fill_color.clone()),
            opacity: marker.style.opacity.unwrap_or(defaults.opacity),
            stroke_width: marker.style.stroke_width.unwrap_or(defaults.stroke_width),
        }
    }
}
