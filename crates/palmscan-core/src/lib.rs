//! # Palmscan Core
//!
//! Core types and traits for Palmscan survey sessions.
//! Provides the drawing and geometry model, the region entity, the detection
//! capability trait, the collaborator traits for inference and persistence,
//! and the error taxonomy shared by every other crate.

pub mod detection;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod region;
pub mod style;

pub use detection::{Detection, DetectionGeometry, DetectionRecord};

pub use error::{
    GeometryError, InferenceError, PersistenceError, PersistenceResult, SessionError,
    SessionResult,
};

pub use geometry::{BoundingBox, Drawing, GeoPoint, RegionGeometry, EARTH_RADIUS_M};

pub use pipeline::{InferenceOutput, InferencePipeline, NoPersistence, PersistenceSink};

pub use region::{Predictions, Region, RegionId};

pub use style::{HighlightStyle, MarkerStyle};
