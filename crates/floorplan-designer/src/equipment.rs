//! Seam to the external equipment-configuration collaborator.
//!
//! Placing an equipment pin opens the collaborator's form seeded with the
//! clicked position. The marker is only created once the collaborator
//! hands back an equipment identity.

use async_trait::async_trait;
use floorplan_core::{AppEvent, EquipmentError, EventBus, MarkerId, MarkerKind, Point};

/// What the collaborator is asked to configure.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentRequest {
    pub kind: MarkerKind,
    pub project_id: i64,
    pub position: Point,
    /// Set when reconfiguring an existing pin.
    pub existing_equipment_id: Option<i64>,
    /// The pin being reconfigured, if any.
    pub marker: Option<MarkerId>,
}

/// The collaborator's answer.
#[derive(Debug, Clone, PartialEq)]
pub enum EquipmentChoice {
    Selected { equipment_id: i64, label: String },
    Cancelled,
}

#[async_trait]
pub trait EquipmentConfigurator: Send + Sync {
    async fn configure(&self, request: EquipmentRequest) -> Result<EquipmentChoice, EquipmentError>;
}

/// Runs the collaborator, recovering from the failures it can report.
///
/// A stale `existing_equipment_id` is dropped and the form reopened in
/// "create new" mode, where the user may still cancel. An unreachable
/// collaborator is reported on `bus` and treated as a cancellation.
pub async fn configure_equipment(
    configurator: &dyn EquipmentConfigurator,
    request: EquipmentRequest,
    bus: &EventBus,
) -> EquipmentChoice {
    let mut request = request;
    loop {
        match configurator.configure(request.clone()).await {
            Ok(choice) => return choice,
            Err(EquipmentError::NotFound { equipment_id })
                if request.existing_equipment_id.is_some() =>
            {
                tracing::warn!("equipment {} no longer exists, offering a new one", equipment_id);
                bus.publish(AppEvent::warning(format!(
                    "Equipment {} no longer exists; create a new one or cancel",
                    equipment_id
                )));
                request.existing_equipment_id = None;
            }
            Err(e) => {
                tracing::error!("equipment configuration failed: {}", e);
                bus.publish(AppEvent::error(format!("Could not configure equipment: {}", e)));
                return EquipmentChoice::Cancelled;
            }
        }
    }
}
