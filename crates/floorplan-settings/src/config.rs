//! Configuration for the floorplan editor
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML files stored in the platform configuration directory.
//!
//! Configuration is organized into sections:
//! - Viewport limits (scale clamp, wheel zoom step)
//! - Interaction thresholds (shape size, vertex spacing, hit tolerances)
//! - Storage service connection
//! - Default marker styling

use floorplan_core::constants;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Viewport limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Smallest document-to-pixel scale
    pub min_scale: f64,
    /// Largest document-to-pixel scale
    pub max_scale: f64,
    /// Zoom factor per wheel notch
    pub wheel_zoom_step: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_scale: constants::MIN_SCALE,
            max_scale: constants::MAX_SCALE,
            wheel_zoom_step: constants::WHEEL_ZOOM_STEP,
        }
    }
}

/// Interaction thresholds. Pixel values are converted to document space
/// with the current scale at the time of use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Drag-sized shapes at or below this size are discarded
    pub min_shape_px: f64,
    /// Minimum distance between consecutive polyline vertices
    pub vertex_spacing_px: f64,
    /// Slack around strokes for hit testing
    pub hit_tolerance_px: f64,
    /// Resize handle side length
    pub handle_size_px: f64,
    /// Hit radius of pin-like markers
    pub pin_radius_px: f64,
    /// Document-space offset for duplicates
    pub duplicate_offset: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_shape_px: constants::MIN_SHAPE_PX,
            vertex_spacing_px: constants::VERTEX_SPACING_PX,
            hit_tolerance_px: constants::HIT_TOLERANCE_PX,
            handle_size_px: constants::HANDLE_SIZE_PX,
            pin_radius_px: constants::PIN_RADIUS_PX,
            duplicate_offset: constants::DUPLICATE_OFFSET,
        }
    }
}

/// Storage service connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub base_url: String,
    pub floorplan_id: i64,
    /// Project passed to the equipment-configuration collaborator
    pub project_id: i64,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            floorplan_id: 0,
            project_id: 0,
            timeout_ms: 10_000,
        }
    }
}

/// Styling used when neither the marker nor its layer sets a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub stroke_color: String,
    pub fill_color: String,
    pub opacity: f32,
    pub stroke_width: f32,
    /// Content of newly placed notes
    pub note_text: String,
    /// Content of newly placed text labels
    pub label_text: String,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            stroke_color: constants::DEFAULT_STROKE_COLOR.to_string(),
            fill_color: constants::DEFAULT_FILL_COLOR.to_string(),
            opacity: constants::DEFAULT_OPACITY,
            stroke_width: constants::DEFAULT_STROKE_WIDTH,
            note_text: constants::DEFAULT_NOTE_TEXT.to_string(),
            label_text: constants::DEFAULT_LABEL_TEXT.to_string(),
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportSettings,
    pub interaction: InteractionSettings,
    pub persistence: PersistenceSettings,
    pub style: StyleSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/floorplan/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory".to_string())
            })?;
        Ok(dir.join("floorplan").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0 && v.min_scale.is_finite()) {
            return Err(ConfigError::out_of_range("viewport.min_scale", v.min_scale));
        }
        if !(v.max_scale >= v.min_scale && v.max_scale.is_finite()) {
            return Err(ConfigError::out_of_range("viewport.max_scale", v.max_scale));
        }
        if !(v.wheel_zoom_step > 1.0 && v.wheel_zoom_step.is_finite()) {
            return Err(ConfigError::out_of_range(
                "viewport.wheel_zoom_step",
                v.wheel_zoom_step,
            ));
        }

        let i = &self.interaction;
        for (key, value) in [
            ("interaction.min_shape_px", i.min_shape_px),
            ("interaction.vertex_spacing_px", i.vertex_spacing_px),
            ("interaction.hit_tolerance_px", i.hit_tolerance_px),
            ("interaction.handle_size_px", i.handle_size_px),
            ("interaction.pin_radius_px", i.pin_radius_px),
            ("interaction.duplicate_offset", i.duplicate_offset),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::out_of_range(key, value));
            }
        }

        if self.persistence.base_url.trim().is_empty() {
            return Err(ConfigError::MissingKey("persistence.base_url".to_string()));
        }
        if self.persistence.timeout_ms == 0 {
            return Err(ConfigError::out_of_range("persistence.timeout_ms", 0));
        }

        let s = &self.style;
        for (key, value) in [
            ("style.stroke_color", &s.stroke_color),
            ("style.fill_color", &s.fill_color),
        ] {
            if !is_hex_color(value) {
                return Err(ConfigError::InvalidColor {
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
        }
        if !(0.0..=1.0).contains(&s.opacity) {
            return Err(ConfigError::out_of_range("style.opacity", s.opacity));
        }
        if !(s.stroke_width > 0.0) {
            return Err(ConfigError::out_of_range("style.stroke_width", s.stroke_width));
        }

        Ok(())
    }
}
