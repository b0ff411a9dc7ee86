//! Configuration file handling
//!
//! Every section carries defaults so a partial file is still a valid
//! configuration. Files are read and written as JSON or TOML depending on
//! the extension, and validated in both directions.

use crate::error::{ConfigError, SettingsResult};
use palmscan_core::MarkerStyle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Application directory name under the platform config dir
const APP_DIR: &str = "palmscan";

/// Default configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Satellite imagery tiles
const DEFAULT_TILE: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// Map surface and overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapUiSettings {
    /// Tile URL template
    pub tile: String,
    pub tile_attribution: String,
    /// Name of the prediction overlay layer
    pub layergroup_name: String,
    /// Marker style for every detection
    pub prediction: MarkerStyle,
}

impl Default for MapUiSettings {
    fn default() -> Self {
        Self {
            tile: DEFAULT_TILE.to_string(),
            tile_attribution: "Esri World Imagery".to_string(),
            layergroup_name: "Predictions".to_string(),
            prediction: MarkerStyle::default(),
        }
    }
}

/// Inference model settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Model weights location, handed to the pipeline as is
    pub model_path: Option<PathBuf>,
    /// Detections below this score are discarded by the pipeline
    pub confidence_threshold: Option<f64>,
}

/// Detection persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub enabled: bool,
    /// JSON-lines output file
    pub output_path: PathBuf,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: PathBuf::from("detections.jsonl"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Log file; stdout when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map_ui: MapUiSettings,
    pub inference: InferenceSettings,
    pub persistence: PersistenceSettings,
    pub logging: LoggingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Load from `path` when given, otherwise from the default location if a
    /// file exists there, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Ok(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let style = &self.map_ui.prediction;

        if self.map_ui.layergroup_name.trim().is_empty() {
            return Err(ConfigError::MissingKey("map_ui.layergroup_name".to_string()));
        }

        if !positive(style.radius) {
            return Err(out_of_range("map_ui.prediction.radius", style.radius));
        }

        if !positive(style.weight) {
            return Err(out_of_range("map_ui.prediction.weight", style.weight));
        }

        for (key, value) in [
            ("map_ui.prediction.fill_opacity", style.fill_opacity),
            (
                "map_ui.prediction.highlight.fill_opacity",
                style.highlight.fill_opacity,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(key, value));
            }
        }

        if let Some(threshold) = self.inference.confidence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(out_of_range("inference.confidence_threshold", threshold));
            }
        }

        if self.persistence.enabled && self.persistence.output_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey(
                "persistence.output_path".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::MissingKey("logging.level".to_string()));
        }

        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn out_of_range(key: &str, value: f64) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Default configuration file location under the platform config directory
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
}
