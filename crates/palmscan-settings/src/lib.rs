//! Palmscan Settings Crate
//!
//! Handles application configuration: map overlay styling, inference model
//! location, persistence switch, and logging.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, Config, InferenceSettings, LoggingSettings, MapUiSettings,
    PersistenceSettings,
};
pub use error::{ConfigError, SettingsError, SettingsResult};
