//! Region entity: one user-drawn area plus its inference results.

use crate::detection::{Detection, DetectionRecord};
use crate::error::{GeometryError, SessionError, SessionResult};
use crate::geometry::{Drawing, RegionGeometry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a region within and across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub Uuid);

impl RegionId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of running inference on a region
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions<D> {
    /// At least one object was detected
    Detected(Vec<D>),
    /// Inference ran and found nothing
    Empty,
}

impl<D> Predictions<D> {
    /// Classify a pipeline result; `None` and an empty list both mean nothing was found
    pub fn from_detections(detections: Option<Vec<D>>) -> Self {
        match detections {
            Some(list) if !list.is_empty() => Predictions::Detected(list),
            _ => Predictions::Empty,
        }
    }

    /// Number of detections
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True for the empty marker
    pub fn is_empty(&self) -> bool {
        matches!(self, Predictions::Empty)
    }

    /// Detections as a slice; empty for the empty marker
    pub fn as_slice(&self) -> &[D] {
        match self {
            Predictions::Detected(list) => list,
            Predictions::Empty => &[],
        }
    }
}

/// A single user-delineated region
///
/// Geometry and area are fixed at construction. Predictions move from absent
/// to present exactly once.
#[derive(Debug, Clone)]
pub struct Region<D = DetectionRecord> {
    id: RegionId,
    drawing: Drawing,
    geometry: RegionGeometry,
    area: f64,
    created_at: DateTime<Utc>,
    predictions: Option<Predictions<D>>,
}

impl<D: Detection> Region<D> {
    /// Build a region from a raw drawing, deriving its geometry and area
    pub fn from_drawing(drawing: Drawing) -> Result<Self, GeometryError> {
        let geometry = RegionGeometry::from_drawing(&drawing)?;
        let area = geometry.area_m2();
        Ok(Self {
            id: RegionId::new(),
            drawing,
            geometry,
            area,
            created_at: Utc::now(),
            predictions: None,
        })
    }

    /// Record the inference outcome.
    ///
    /// Fails if predictions were already recorded for this region.
    pub fn record_predictions(&mut self, predictions: Predictions<D>) -> SessionResult<()> {
        if self.predictions.is_some() {
            return Err(SessionError::invariant(format!(
                "predictions for region {} were already recorded",
                self.id
            )));
        }
        self.predictions = Some(predictions);
        Ok(())
    }

    /// Region identifier
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Raw drawing, used as the identity key
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    /// Normalised geometry
    pub fn geometry(&self) -> &RegionGeometry {
        &self.geometry
    }

    /// Area in square metres
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Inference outcome, `None` until inference completed
    pub fn predictions(&self) -> Option<&Predictions<D>> {
        self.predictions.as_ref()
    }

    /// Whether inference has completed for this region
    pub fn is_processed(&self) -> bool {
        self.predictions.is_some()
    }

    /// Number of detections; zero while unprocessed
    pub fn detection_count(&self) -> usize {
        self.predictions.as_ref().map_or(0, Predictions::len)
    }
}
