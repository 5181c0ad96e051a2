//! Floorplan Settings Crate
//!
//! Editor configuration: viewport limits, interaction thresholds, storage
//! service connection and default marker styling.

pub mod config;
pub mod error;

pub use config::{
    Config, InteractionSettings, PersistenceSettings, StyleSettings, ViewportSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
