//! Session driver
//!
//! A [`Session`] owns the state of one user session together with its
//! collaborators and runs one reconciliation cycle per UI interaction. The
//! caller re-renders the map when a cycle reports `refresh_requested` and
//! feeds the next drawing snapshot back in; there is no internal loop.

use crate::invoker::{InferenceInvoker, PersistenceStatus};
use crate::metrics::SessionMetrics;
use crate::overlay::OverlayLayer;
use crate::reconciler::{reconcile, Reconciliation};
use crate::store::SessionState;
use palmscan_core::{
    Detection, DetectionRecord, Drawing, InferencePipeline, MarkerStyle, NoPersistence,
    PersistenceError, PersistenceSink, Region, RegionId, SessionResult,
};
use tracing::{debug, error};

/// Action a cycle took
#[derive(Debug, Clone, PartialEq)]
pub enum CycleAction {
    /// The snapshot held nothing new
    NoOp,
    /// All drawings were removed and the store cleared
    Reset,
    /// The newest drawing was processed into a region
    Processed {
        region: RegionId,
        detections: usize,
    },
}

/// Result of one reconciliation cycle
#[derive(Debug)]
pub struct CycleReport {
    pub action: CycleAction,
    /// The overlay is stale and must be redrawn
    pub refresh_requested: bool,
    /// Set only when a region was processed
    pub persistence: Option<PersistenceStatus>,
    /// Metrics after the cycle
    pub metrics: SessionMetrics,
}

impl CycleReport {
    /// Sink error from this cycle, if the new region could not be saved
    pub fn persistence_failure(&self) -> Option<&PersistenceError> {
        self.persistence.as_ref().and_then(PersistenceStatus::failure)
    }
}

/// One user session: region state plus the pipeline and optional sink
pub struct Session<P, S = NoPersistence, D = DetectionRecord> {
    state: SessionState<D>,
    pipeline: P,
    sink: Option<S>,
}

impl<P, D> Session<P, NoPersistence, D>
where
    D: Detection,
    P: InferencePipeline<D>,
{
    /// Start a session that never persists detections
    pub fn new(pipeline: P) -> Self {
        Self {
            state: SessionState::new(),
            pipeline,
            sink: None,
        }
    }
}

impl<P, S, D> Session<P, S, D>
where
    D: Detection,
    P: InferencePipeline<D>,
    S: PersistenceSink<D>,
{
    /// Start a session that persists detections through `sink`
    pub fn with_sink(pipeline: P, sink: S) -> Self {
        Self {
            state: SessionState::new(),
            pipeline,
            sink: Some(sink),
        }
    }

    /// Run one reconciliation cycle for the current drawing snapshot.
    ///
    /// On error the session state is exactly what it was before the call.
    pub fn cycle(&mut self, drawings: Option<&[Drawing]>) -> SessionResult<CycleReport> {
        let result = self.run(drawings);
        match &result {
            Ok(_) => self.state.observe(drawings.unwrap_or_default()),
            Err(e) => error!("Reconciliation cycle failed: {}", e),
        }
        result
    }

    fn run(&mut self, drawings: Option<&[Drawing]>) -> SessionResult<CycleReport> {
        let (action, persistence) = match reconcile(&mut self.state, drawings)? {
            Reconciliation::NoOp => (CycleAction::NoOp, None),
            Reconciliation::Reset => (CycleAction::Reset, None),
            Reconciliation::ProcessLast(drawing) => {
                let invocation = InferenceInvoker::new(&self.pipeline, self.sink.as_mut())
                    .invoke(&mut self.state, drawing)?;
                (
                    CycleAction::Processed {
                        region: invocation.region,
                        detections: invocation.detections,
                    },
                    Some(invocation.persistence),
                )
            }
        };

        let metrics = self.metrics();
        debug!(
            total_area = metrics.total_area,
            total_count = metrics.total_count,
            "Metrics recomputed"
        );

        Ok(CycleReport {
            refresh_requested: action != CycleAction::NoOp,
            action,
            persistence,
            metrics,
        })
    }

    /// Current metrics over all regions
    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics::from_regions(self.regions())
    }

    /// Prediction overlay for the current regions
    pub fn overlay(&self, name: &str, style: &MarkerStyle) -> OverlayLayer {
        OverlayLayer::build(name, self.regions(), style)
    }

    /// Regions processed so far, oldest first
    pub fn regions(&self) -> &[Region<D>] {
        self.state.store().snapshot()
    }

    /// Inference pipeline used by this session
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Session state
    pub fn state(&self) -> &SessionState<D> {
        &self.state
    }
}
