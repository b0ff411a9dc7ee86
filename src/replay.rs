//! Recorded session replay
//!
//! A replay script holds the drawing snapshots a map surface reported over
//! one session, in order, plus the detections a model returned for each
//! drawing. Replaying feeds the snapshots through a [`Session`] with a
//! [`RecordedInference`] pipeline, so reconciliation can be exercised and
//! inspected without a map or a model.

use anyhow::Context;
use palmscan_core::{
    Detection, DetectionRecord, Drawing, GeometryError, InferenceError, InferenceOutput,
    InferencePipeline, PersistenceSink, RegionGeometry,
};
use palmscan_session::{CycleAction, Session, SessionMetrics};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::Path;
use tracing::{info, warn};

/// Detections recorded for one drawing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub drawing: Drawing,
    #[serde(default)]
    pub detections: Vec<DetectionRecord>,
}

/// A recorded session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Drawing snapshots in the order they were reported; `null` stands for
    /// a surface that reported no drawing state at all
    pub snapshots: Vec<Option<Vec<Drawing>>>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

impl ReplayScript {
    /// Load a script from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid replay script {}", path.display()))
    }
}

/// Inference pipeline answering from recorded detections.
///
/// Lookup is by normalised region geometry, so a recording matches a drawing
/// whatever closing-vertex or wrapper form either was written in. Regions
/// without a recording yield no detections.
#[derive(Debug)]
pub struct RecordedInference {
    recordings: Vec<(RegionGeometry, Vec<DetectionRecord>)>,
    confidence_threshold: Option<f64>,
    calls: Cell<usize>,
}

impl RecordedInference {
    /// Index the recordings of a script
    pub fn from_recordings(recordings: &[Recording]) -> Result<Self, GeometryError> {
        let recordings = recordings
            .iter()
            .map(|r| Ok((RegionGeometry::from_drawing(&r.drawing)?, r.detections.clone())))
            .collect::<Result<Vec<_>, GeometryError>>()?;
        Ok(Self {
            recordings,
            confidence_threshold: None,
            calls: Cell::new(0),
        })
    }

    /// Drop detections scoring below `threshold`; unscored detections are kept
    pub fn with_confidence_threshold(mut self, threshold: Option<f64>) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Number of times the pipeline has run
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl InferencePipeline for RecordedInference {
    fn run(&self, geometry: &RegionGeometry) -> Result<InferenceOutput, InferenceError> {
        self.calls.set(self.calls.get() + 1);

        let Some((_, detections)) = self.recordings.iter().find(|(g, _)| g == geometry) else {
            return Ok(InferenceOutput::nothing());
        };

        let kept: Vec<DetectionRecord> = detections
            .iter()
            .filter(|d| match (self.confidence_threshold, d.score()) {
                (Some(threshold), Some(score)) => score >= threshold,
                _ => true,
            })
            .cloned()
            .collect();

        if kept.is_empty() {
            Ok(InferenceOutput::nothing())
        } else {
            Ok(InferenceOutput::detected(kept))
        }
    }
}

/// Outcome of a replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub cycles: usize,
    pub processed: usize,
    pub resets: usize,
    pub no_ops: usize,
    /// Cycles that failed; the session carried on with the next snapshot
    pub failed: usize,
    pub persistence_failures: usize,
    pub metrics: SessionMetrics,
}

/// Feed every snapshot through the session, one cycle each.
///
/// A failed cycle is logged and counted; the next snapshot is still played,
/// as the map surface would keep reporting after an error.
pub fn run_replay<S>(
    session: &mut Session<RecordedInference, S>,
    snapshots: &[Option<Vec<Drawing>>],
) -> ReplaySummary
where
    S: PersistenceSink,
{
    let mut summary = ReplaySummary::default();

    for (index, snapshot) in snapshots.iter().enumerate() {
        summary.cycles += 1;
        match session.cycle(snapshot.as_deref()) {
            Ok(report) => {
                match report.action {
                    CycleAction::NoOp => summary.no_ops += 1,
                    CycleAction::Reset => summary.resets += 1,
                    CycleAction::Processed { .. } => summary.processed += 1,
                }
                if let Some(err) = report.persistence_failure() {
                    summary.persistence_failures += 1;
                    warn!(cycle = index, "Detections not persisted: {}", err);
                }
            }
            Err(e) => {
                summary.failed += 1;
                warn!(cycle = index, "Cycle failed: {}", e);
            }
        }
    }

    summary.metrics = session.metrics();
    info!(
        cycles = summary.cycles,
        processed = summary.processed,
        failed = summary.failed,
        "Replay finished: {}",
        summary.metrics
    );
    summary
}
