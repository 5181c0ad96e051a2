//! # Floorplan Gateway
//!
//! The only point of contact with the external marker, layer and
//! calibration storage service.
//!
//! - [`MarkerBackend`] abstracts the service; [`HttpBackend`] talks REST and
//!   [`InMemoryBackend`] keeps records in process.
//! - [`PersistenceGateway`] runs requests off the interaction loop. Marker
//!   mutations are serialised per marker key so a marker's requests reach
//!   the backend in the order they were issued. Results come back as
//!   [`Outcome`]s that the owner drains on its own schedule.

pub mod backend;
pub mod gateway;
pub mod http;
pub mod memory;

pub use backend::MarkerBackend;
pub use gateway::{MutationKind, Outcome, PersistenceGateway, Request};
pub use http::{HttpBackend, HttpBackendConfig};
pub use memory::{BackendCall, InMemoryBackend};
