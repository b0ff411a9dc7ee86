//! Error handling for Palmscan
//!
//! Provides error types for every stage of a reconciliation cycle:
//! - Geometry errors (drawing payloads that cannot be normalised)
//! - Inference errors (raised by the external detection pipeline)
//! - Persistence errors (raised by the storage sink, recoverable)
//! - Session errors (fatal to the current cycle)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised when a raw drawing cannot be turned into a region geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The payload is not a GeoJSON feature or geometry object
    #[error("Drawing is not a GeoJSON object: {reason}")]
    Malformed {
        /// What was wrong with the payload.
        reason: String,
    },

    /// The geometry type is not supported for regions
    #[error("Unsupported geometry type: {geometry_type}")]
    UnsupportedType {
        /// The GeoJSON `type` member found in the payload.
        geometry_type: String,
    },

    /// The exterior ring has too few distinct vertices
    #[error("Polygon needs at least 3 distinct vertices, got {count}")]
    TooFewVertices {
        /// Number of distinct vertices found.
        count: usize,
    },

    /// A coordinate lies outside the valid longitude/latitude range
    #[error("Coordinate out of range: ({lon}, {lat})")]
    CoordinateOutOfRange {
        /// Longitude in degrees.
        lon: f64,
        /// Latitude in degrees.
        lat: f64,
    },
}

/// Inference error type
///
/// Raised by an [`InferencePipeline`](crate::InferencePipeline). Always fatal
/// to the cycle that triggered it.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model could not be loaded or executed
    #[error("Model error: {0}")]
    Model(String),

    /// The pipeline rejected the region it was given
    #[error("Invalid inference input: {0}")]
    InvalidInput(String),

    /// Any other failure reported by the pipeline
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence error type
///
/// Raised by a [`PersistenceSink`](crate::PersistenceSink). Converted into a
/// recoverable signal by the session; never rolls back in-memory state.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The sink is not reachable
    #[error("Persistence sink unavailable: {0}")]
    Unavailable(String),

    /// The sink refused the record
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Session error type
///
/// Every variant aborts the current reconciliation cycle and leaves the
/// region store exactly as it was before the cycle started.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A region would be appended twice, or its predictions set twice
    #[error("Invariant violation: {reason}")]
    InvariantViolation {
        /// Description of the broken invariant.
        reason: String,
    },

    /// The inference pipeline failed
    #[error("Inference failed: {0}")]
    InferenceFailure(#[from] InferenceError),

    /// The newest drawing could not be normalised
    #[error("Invalid drawing: {0}")]
    InvalidDrawing(#[from] GeometryError),

    /// The drawing list shrank without being cleared
    #[error(
        "Drawing list shrank from {previous} to {drawings} without being cleared; \
         clear all drawings to start over"
    )]
    UndefinedReconciliationState {
        /// Number of drawings reported by the rendering surface.
        drawings: usize,
        /// Number of drawings in the last reconciled snapshot.
        previous: usize,
    },
}

impl SessionError {
    /// Create an invariant violation from a message
    pub fn invariant(reason: impl Into<String>) -> Self {
        SessionError::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Check if this is an invariant violation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SessionError::InvariantViolation { .. })
    }

    /// Check if this is an inference failure
    pub fn is_inference_failure(&self) -> bool {
        matches!(self, SessionError::InferenceFailure(_))
    }

    /// Check if this is an unclassified reconciliation state
    pub fn is_undefined_state(&self) -> bool {
        matches!(self, SessionError::UndefinedReconciliationState { .. })
    }
}

/// Result type for reconciliation cycles
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type for persistence sinks
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
