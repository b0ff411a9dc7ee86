//! Collaborator interfaces
//!
//! Defines the traits the session uses to reach the external inference
//! pipeline and the persistence sink. Both are synchronous: a reconciliation
//! cycle blocks on them and has no way to cancel a call in flight.

use crate::detection::{Detection, DetectionRecord};
use crate::error::{InferenceError, PersistenceResult};
use crate::geometry::RegionGeometry;
use crate::region::RegionId;

/// Result of running inference on one region
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutput<D = DetectionRecord> {
    /// Detections, or `None` when the pipeline found nothing
    pub detections: Option<Vec<D>>,
}

impl<D> InferenceOutput<D> {
    /// Output carrying the given detections
    pub fn detected(detections: Vec<D>) -> Self {
        Self {
            detections: Some(detections),
        }
    }

    /// Output for a region where nothing was found
    pub fn nothing() -> Self {
        Self { detections: None }
    }
}

/// Object detection pipeline
///
/// Implement this trait to plug a model into a session. Calls may block for
/// as long as the model needs.
pub trait InferencePipeline<D: Detection = DetectionRecord> {
    /// Detect objects inside the region
    fn run(&self, geometry: &RegionGeometry) -> Result<InferenceOutput<D>, InferenceError>;
}

impl<D, F> InferencePipeline<D> for F
where
    D: Detection,
    F: Fn(&RegionGeometry) -> Result<InferenceOutput<D>, InferenceError>,
{
    fn run(&self, geometry: &RegionGeometry) -> Result<InferenceOutput<D>, InferenceError> {
        self(geometry)
    }
}

/// Durable store for region detections
///
/// A single `save` call is atomic; nothing else is assumed.
pub trait PersistenceSink<D: Detection = DetectionRecord> {
    /// Store the detections found in a region
    fn save(
        &mut self,
        region: RegionId,
        geometry: &RegionGeometry,
        predictions: &[D],
    ) -> PersistenceResult<()>;
}

/// Placeholder sink type for sessions that never persist
///
/// A session built without a sink holds no value of this type, so `save` is
/// never reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl<D: Detection> PersistenceSink<D> for NoPersistence {
    fn save(&mut self, _: RegionId, _: &RegionGeometry, _: &[D]) -> PersistenceResult<()> {
        Ok(())
    }
}
