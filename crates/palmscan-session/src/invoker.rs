//! Inference invoker
//!
//! Turns one new drawing into a processed region: derive the geometry, run
//! the pipeline, record predictions, persist them, append to the store.
//! Inference failures abort the cycle before the store is touched.
//! Persistence failures are reported but the region is kept.

use crate::store::SessionState;
use palmscan_core::{
    Detection, Drawing, InferencePipeline, PersistenceError, PersistenceSink, Predictions, Region,
    RegionId, SessionError, SessionResult,
};
use tracing::{error, info, warn};

/// What happened to the detections of a newly processed region
#[derive(Debug)]
pub enum PersistenceStatus {
    /// Detections were stored by the sink
    Saved,
    /// No sink is configured for this session
    Disabled,
    /// Inference found nothing, so nothing was sent to the sink
    NothingToSave,
    /// The sink raised; the region is still in the store
    Failed(PersistenceError),
}

impl PersistenceStatus {
    /// The sink error, if persisting failed
    pub fn failure(&self) -> Option<&PersistenceError> {
        match self {
            PersistenceStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Summary of one successful invocation
#[derive(Debug)]
pub struct Invocation {
    /// Identifier of the appended region
    pub region: RegionId,
    /// Number of detections recorded
    pub detections: usize,
    pub persistence: PersistenceStatus,
}

/// Runs inference for exactly one new drawing per call
pub struct InferenceInvoker<'a, P, S> {
    pipeline: &'a P,
    sink: Option<&'a mut S>,
}

impl<'a, P, S> InferenceInvoker<'a, P, S> {
    /// Create an invoker; pass `None` to skip persistence
    pub fn new(pipeline: &'a P, sink: Option<&'a mut S>) -> Self {
        Self { pipeline, sink }
    }

    /// Process a new drawing and append the resulting region.
    ///
    /// Blocks for as long as the pipeline takes. On error the store is left
    /// unchanged and the sink has not been called.
    pub fn invoke<D>(
        &mut self,
        state: &mut SessionState<D>,
        drawing: Drawing,
    ) -> SessionResult<Invocation>
    where
        D: Detection,
        P: InferencePipeline<D>,
        S: PersistenceSink<D>,
    {
        if state.store().contains(&drawing) {
            return Err(SessionError::invariant(
                "drawing already has a region in this session",
            ));
        }

        let mut region = Region::from_drawing(drawing)?;

        let output = self.pipeline.run(region.geometry()).map_err(|e| {
            error!(region = %region.id(), "Inference failed: {}", e);
            SessionError::from(e)
        })?;

        region.record_predictions(Predictions::from_detections(output.detections))?;
        let detections = region.detection_count();

        let persistence = if detections == 0 {
            info!(region = %region.id(), "No predictions found");
            PersistenceStatus::NothingToSave
        } else {
            self.persist(&region)
        };

        let invocation = Invocation {
            region: region.id(),
            detections,
            persistence,
        };
        state.store_mut().append(region)?;
        Ok(invocation)
    }

    fn persist<D>(&mut self, region: &Region<D>) -> PersistenceStatus
    where
        D: Detection,
        S: PersistenceSink<D>,
    {
        let Some(sink) = self.sink.as_deref_mut() else {
            return PersistenceStatus::Disabled;
        };
        let predictions = region
            .predictions()
            .map(Predictions::as_slice)
            .unwrap_or_default();
        match sink.save(region.id(), region.geometry(), predictions) {
            Ok(()) => {
                info!(region = %region.id(), detections = predictions.len(), "Data saved");
                PersistenceStatus::Saved
            }
            Err(e) => {
                warn!(region = %region.id(), "Failed to save detections: {}", e);
                PersistenceStatus::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmscan_core::{
        DetectionRecord, InferenceError, InferenceOutput, NoPersistence, PersistenceResult,
        RegionGeometry,
    };
    use std::cell::Cell;

    struct CountingPipeline {
        calls: Cell<usize>,
        found: usize,
    }

    impl CountingPipeline {
        fn finding(found: usize) -> Self {
            Self {
                calls: Cell::new(0),
                found,
            }
        }
    }

    impl InferencePipeline for CountingPipeline {
        fn run(&self, geometry: &RegionGeometry) -> Result<InferenceOutput, InferenceError> {
            self.calls.set(self.calls.get() + 1);
            let c = geometry.bounds().center();
            Ok(InferenceOutput::detected(
                (0..self.found)
                    .map(|_| DetectionRecord::point(c.lon, c.lat))
                    .collect(),
            ))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: Vec<RegionId>,
        fail: bool,
    }

    impl PersistenceSink for RecordingSink {
        fn save(
            &mut self,
            region: RegionId,
            _geometry: &RegionGeometry,
            _predictions: &[DetectionRecord],
        ) -> PersistenceResult<()> {
            if self.fail {
                return Err(PersistenceError::Unavailable("database offline".to_string()));
            }
            self.saved.push(region);
            Ok(())
        }
    }

    fn drawing() -> Drawing {
        Drawing::rectangle(0.0, 0.0, 0.01, 0.01)
    }

    #[test]
    fn test_invoke_appends_and_persists() {
        let pipeline = CountingPipeline::finding(3);
        let mut sink = RecordingSink::default();
        let mut state: SessionState = SessionState::new();

        let inv = InferenceInvoker::new(&pipeline, Some(&mut sink))
            .invoke(&mut state, drawing())
            .unwrap();

        assert_eq!(inv.detections, 3);
        assert!(matches!(inv.persistence, PersistenceStatus::Saved));
        assert_eq!(state.store().len(), 1);
        assert_eq!(pipeline.calls.get(), 1);
        assert_eq!(sink.saved, vec![inv.region]);
    }

    #[test]
    fn test_empty_result_skips_sink() {
        let pipeline = CountingPipeline::finding(0);
        let mut sink = RecordingSink::default();
        let mut state: SessionState = SessionState::new();

        let inv = InferenceInvoker::new(&pipeline, Some(&mut sink))
            .invoke(&mut state, drawing())
            .unwrap();

        assert!(matches!(inv.persistence, PersistenceStatus::NothingToSave));
        assert!(sink.saved.is_empty());
        let region = &state.store().snapshot()[0];
        assert!(region.predictions().unwrap().is_empty());
    }

    #[test]
    fn test_no_sink_reports_disabled() {
        let pipeline = CountingPipeline::finding(2);
        let mut state: SessionState = SessionState::new();

        let inv = InferenceInvoker::<_, NoPersistence>::new(&pipeline, None)
            .invoke(&mut state, drawing())
            .unwrap();

        assert!(matches!(inv.persistence, PersistenceStatus::Disabled));
        assert_eq!(state.store().len(), 1);
    }

    #[test]
    fn test_sink_failure_keeps_region() {
        let pipeline = CountingPipeline::finding(1);
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut state: SessionState = SessionState::new();

        let inv = InferenceInvoker::new(&pipeline, Some(&mut sink))
            .invoke(&mut state, drawing())
            .unwrap();

        assert!(inv.persistence.failure().is_some());
        assert_eq!(state.store().len(), 1);
        assert_eq!(state.store().snapshot()[0].detection_count(), 1);
    }

    #[test]
    fn test_inference_failure_leaves_store_untouched() {
        let failing = |_: &RegionGeometry| -> Result<InferenceOutput, InferenceError> {
            Err(InferenceError::Model("CUDA out of memory".to_string()))
        };
        let mut sink = RecordingSink::default();
        let mut state: SessionState = SessionState::new();

        let err = InferenceInvoker::new(&failing, Some(&mut sink))
            .invoke(&mut state, drawing())
            .unwrap_err();

        assert!(err.is_inference_failure());
        assert!(state.store().is_empty());
        assert!(sink.saved.is_empty());
    }

    #[test]
    fn test_duplicate_drawing_rejected_before_inference() {
        let pipeline = CountingPipeline::finding(1);
        let mut state: SessionState = SessionState::new();
        let mut invoker = InferenceInvoker::<_, NoPersistence>::new(&pipeline, None);

        invoker.invoke(&mut state, drawing()).unwrap();
        let err = invoker.invoke(&mut state, drawing()).unwrap_err();

        assert!(err.is_invariant_violation());
        assert_eq!(pipeline.calls.get(), 1);
        assert_eq!(state.store().len(), 1);
    }

    #[test]
    fn test_invalid_drawing_is_fatal() {
        let pipeline = CountingPipeline::finding(1);
        let mut state: SessionState = SessionState::new();
        let bad = Drawing::new(serde_json::json!({ "type": "Feature", "geometry": null }));

        let err = InferenceInvoker::<_, NoPersistence>::new(&pipeline, None)
            .invoke(&mut state, bad)
            .unwrap_err();

        assert!(matches!(err, SessionError::InvalidDrawing(_)));
        assert_eq!(pipeline.calls.get(), 0);
    }
}
