use serde::{Deserialize, Serialize};

/// Server-assigned layer identifier.
pub type LayerId = i64;

/// A named group of markers sharing a default colour and a visibility flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Default stroke colour for markers on this layer (hex RGB).
    pub color: String,
    pub visible: bool,
    /// Z-order and list position; lower values draw first.
    pub order_index: i32,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            visible: true,
            order_index: 0,
        }
    }
}
