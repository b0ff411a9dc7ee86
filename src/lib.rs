//! # Palmscan
//!
//! Incremental survey sessions over user-drawn map regions. Every region a
//! user draws is sent to an inference pipeline exactly once; its detections
//! are optionally persisted and folded into running session statistics
//! (area, count, density).
//!
//! ## Architecture
//!
//! Palmscan is organized as a workspace with multiple crates:
//!
//! 1. **palmscan-core** - Drawings, region geometry, detections, errors, collaborator traits
//! 2. **palmscan-session** - Region store, reconciler, inference invoker, metrics, overlay
//! 3. **palmscan-settings** - Configuration files and validation
//! 4. **palmscan** - Logging setup, recorded-session replay, command line

pub mod replay;

pub use palmscan_core::{
    Detection, DetectionGeometry, DetectionRecord, Drawing, GeoPoint, GeometryError,
    InferenceError, InferenceOutput, InferencePipeline, MarkerStyle, NoPersistence,
    PersistenceError, PersistenceSink, Predictions, Region, RegionGeometry, RegionId,
    SessionError, SessionResult,
};

pub use palmscan_session::{
    CycleAction, CycleReport, JsonLinesSink, OverlayLayer, PersistenceStatus, Reconciliation,
    RegionStore, Session, SessionMetrics, SessionState,
};

pub use palmscan_settings::{Config, ConfigError, LoggingSettings, SettingsError};

pub use replay::{RecordedInference, ReplayScript, ReplaySummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to the
/// configured file in append mode, otherwise to stdout.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use std::fs::OpenOptions;
    use std::sync::Mutex;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    match &settings.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let fmt_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        None => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
