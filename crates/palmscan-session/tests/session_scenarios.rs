//! End-to-end reconciliation cycles over a scripted pipeline

use palmscan_core::{
    DetectionRecord, Drawing, InferenceError, InferenceOutput, InferencePipeline,
    PersistenceError, PersistenceResult, PersistenceSink, RegionGeometry, RegionId,
};
use palmscan_session::{
    CycleAction, JsonLinesSink, PersistedRegion, PersistenceStatus, Session, SessionMetrics,
};
use std::cell::RefCell;
use tempfile::TempDir;

/// Returns `per_region` detections at the region centre and logs every call
struct ScriptedPipeline {
    per_region: usize,
    calls: RefCell<Vec<RegionGeometry>>,
}

impl ScriptedPipeline {
    fn new(per_region: usize) -> Self {
        Self {
            per_region,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl InferencePipeline for ScriptedPipeline {
    fn run(&self, geometry: &RegionGeometry) -> Result<InferenceOutput, InferenceError> {
        self.calls.borrow_mut().push(geometry.clone());
        let c = geometry.bounds().center();
        Ok(InferenceOutput::detected(
            (0..self.per_region)
                .map(|i| {
                    DetectionRecord::point(c.lon, c.lat + i as f64 * 1e-5).with_label("coconut")
                })
                .collect(),
        ))
    }
}

struct BrokenSink;

impl PersistenceSink for BrokenSink {
    fn save(
        &mut self,
        _: RegionId,
        _: &RegionGeometry,
        _: &[DetectionRecord],
    ) -> PersistenceResult<()> {
        Err(PersistenceError::Unavailable("connection refused".to_string()))
    }
}

fn g(i: u32) -> Drawing {
    let lon = 76.0 + f64::from(i) * 0.05;
    Drawing::rectangle(lon, 10.0, lon + 0.01, 10.01)
}

#[test]
fn scenario_a_empty_store_empty_drawings() {
    let mut session = Session::new(ScriptedPipeline::new(3));

    let report = session.cycle(Some(&[])).unwrap();
    assert_eq!(report.action, CycleAction::NoOp);
    assert!(!report.refresh_requested);
    assert!(session.regions().is_empty());

    let report = session.cycle(None).unwrap();
    assert_eq!(report.action, CycleAction::NoOp);
    assert_eq!(session.pipeline().call_count(), 0);
}

#[test]
fn scenario_b_through_e_full_session() {
    let mut session = Session::new(ScriptedPipeline::new(3));

    // B: first drawing is processed
    let report = session.cycle(Some(&[g(1)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { detections: 3, .. }));
    assert!(report.refresh_requested);
    assert!(matches!(report.persistence, Some(PersistenceStatus::Disabled)));
    assert_eq!(session.pipeline().call_count(), 1);

    let area = session.regions()[0].area();
    assert_eq!(report.metrics.total_count, 3);
    assert_eq!(report.metrics.total_area, area);
    assert!((report.metrics.density - 3.0 / area).abs() < 1e-15);

    // C: same snapshot again
    let report = session.cycle(Some(&[g(1)])).unwrap();
    assert_eq!(report.action, CycleAction::NoOp);
    assert!(!report.refresh_requested);
    assert_eq!(session.regions().len(), 1);
    assert_eq!(session.pipeline().call_count(), 1);

    // D: second drawing appended, only it is processed
    let report = session.cycle(Some(&[g(1), g(2)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { .. }));
    assert_eq!(session.pipeline().call_count(), 2);
    assert_eq!(session.regions().len(), 2);
    assert_eq!(session.regions()[0].drawing(), &g(1));
    assert_eq!(session.regions()[1].drawing(), &g(2));
    assert_eq!(report.metrics.total_count, 6);

    // E: everything cleared
    let report = session.cycle(Some(&[])).unwrap();
    assert_eq!(report.action, CycleAction::Reset);
    assert!(report.refresh_requested);
    assert!(session.regions().is_empty());
    assert_eq!(report.metrics, SessionMetrics::default());

    // and a further empty snapshot is a no-op
    let report = session.cycle(Some(&[])).unwrap();
    assert_eq!(report.action, CycleAction::NoOp);
}

#[test]
fn scenario_f_persistence_failure_is_reported_not_fatal() {
    let mut session = Session::with_sink(ScriptedPipeline::new(1), BrokenSink);

    let report = session.cycle(Some(&[g(1)])).unwrap();
    assert!(report.persistence_failure().is_some());
    assert_eq!(report.metrics.total_count, 1);
    assert_eq!(session.regions().len(), 1);

    // the user keeps drawing
    let report = session.cycle(Some(&[g(1), g(2)])).unwrap();
    assert!(report.persistence_failure().is_some());
    assert_eq!(session.regions().len(), 2);
}

#[test]
fn test_inference_failure_keeps_prior_regions() {
    let calls = RefCell::new(0);
    let flaky = |geometry: &RegionGeometry| -> Result<InferenceOutput, InferenceError> {
        *calls.borrow_mut() += 1;
        if *calls.borrow() == 2 {
            return Err(InferenceError::Model("tile fetch timed out".to_string()));
        }
        let c = geometry.bounds().center();
        Ok(InferenceOutput::detected(vec![DetectionRecord::point(c.lon, c.lat)]))
    };
    let mut session = Session::new(flaky);

    session.cycle(Some(&[g(1)])).unwrap();
    let err = session.cycle(Some(&[g(1), g(2)])).unwrap_err();
    assert!(err.is_inference_failure());
    assert_eq!(session.regions().len(), 1);
    assert_eq!(session.state().last_seen(), &[g(1)]);

    // the next interaction retries the same drawing
    let report = session.cycle(Some(&[g(1), g(2)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { .. }));
    assert_eq!(session.regions().len(), 2);
}

#[test]
fn test_shrinking_drawings_surface_undefined_state() {
    let mut session = Session::new(ScriptedPipeline::new(2));
    session.cycle(Some(&[g(1)])).unwrap();
    session.cycle(Some(&[g(1), g(2)])).unwrap();
    session.cycle(Some(&[g(1), g(2), g(3)])).unwrap();

    let err = session.cycle(Some(&[g(1), g(2)])).unwrap_err();
    assert!(err.is_undefined_state());
    assert_eq!(session.state().last_seen(), &[g(1), g(2), g(3)]);
    assert_eq!(session.regions().len(), 3);
    assert_eq!(session.metrics().total_count, 6);

    // clearing everything recovers
    let report = session.cycle(Some(&[])).unwrap();
    assert_eq!(report.action, CycleAction::Reset);
}

#[test]
fn test_duplicate_geometry_is_invariant_violation() {
    let mut session = Session::new(ScriptedPipeline::new(1));
    session.cycle(Some(&[g(1)])).unwrap();
    session.cycle(Some(&[g(1), g(2)])).unwrap();

    let err = session.cycle(Some(&[g(1), g(2), g(1)])).unwrap_err();
    assert!(err.is_invariant_violation());
    assert_eq!(session.pipeline().call_count(), 2);
    assert_eq!(session.regions().len(), 2);
}

#[test]
fn test_json_lines_sink_receives_each_region_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("detections.jsonl");
    let sink = JsonLinesSink::open(&path).unwrap();
    let mut session = Session::with_sink(ScriptedPipeline::new(2), sink);

    for snapshot in [vec![g(1)], vec![g(1)], vec![g(1), g(2)], vec![g(1), g(2)]] {
        session.cycle(Some(snapshot.as_slice())).unwrap();
    }

    let records: Vec<PersistedRegion<DetectionRecord>> = JsonLinesSink::read_all(&path).unwrap();
    assert_eq!(records.len(), 2);
    let ids: Vec<_> = session.regions().iter().map(|r| r.id()).collect();
    assert_eq!(records[0].region_id, ids[0]);
    assert_eq!(records[1].region_id, ids[1]);
    assert!(records.iter().all(|r| r.detections.len() == 2));
}

#[test]
fn test_overlay_tracks_store() {
    let mut session = Session::new(ScriptedPipeline::new(2));
    let style = palmscan_core::MarkerStyle::default();

    session.cycle(Some(&[g(1)])).unwrap();
    session.cycle(Some(&[g(1), g(2)])).unwrap();
    assert_eq!(session.overlay("Predictions", &style).len(), 4);

    session.cycle(None).unwrap();
    assert!(session.overlay("Predictions", &style).is_empty());
}

#[test]
fn test_replaced_drawing_then_identical_snapshot_is_noop() {
    let mut session = Session::new(ScriptedPipeline::new(1));
    session.cycle(Some(&[g(1)])).unwrap();
    session.cycle(Some(&[g(1), g(2)])).unwrap();

    let report = session.cycle(Some(&[g(1), g(9)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { .. }));
    assert_eq!(session.regions().len(), 3);

    let report = session.cycle(Some(&[g(1), g(9)])).unwrap();
    assert_eq!(report.action, CycleAction::NoOp);
    assert!(!report.refresh_requested);
    assert_eq!(session.pipeline().call_count(), 3);

    let report = session.cycle(Some(&[g(1), g(9), g(4)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { .. }));
    assert_eq!(session.regions().len(), 4);
}

#[test]
fn test_several_new_drawings_only_last_is_inferred() {
    let mut session = Session::new(ScriptedPipeline::new(2));

    let report = session.cycle(Some(&[g(1), g(2)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { detections: 2, .. }));
    assert_eq!(session.pipeline().call_count(), 1);
    assert_eq!(
        session.pipeline().calls.borrow()[0],
        RegionGeometry::from_drawing(&g(2)).unwrap()
    );
    assert_eq!(session.regions().len(), 1);
    assert_eq!(session.regions()[0].drawing(), &g(2));

    let report = session.cycle(Some(&[g(1), g(2)])).unwrap();
    assert_eq!(report.action, CycleAction::NoOp);
    assert_eq!(session.pipeline().call_count(), 1);

    let report = session.cycle(Some(&[g(1), g(2), g(3)])).unwrap();
    assert!(matches!(report.action, CycleAction::Processed { .. }));
    assert_eq!(session.pipeline().call_count(), 2);
    assert_eq!(session.regions().len(), 2);

    // two regions stored, so only the snapshot length reveals the shrink
    let err = session.cycle(Some(&[g(1), g(2)])).unwrap_err();
    assert!(err.is_undefined_state());
    assert_eq!(session.regions().len(), 2);
}
