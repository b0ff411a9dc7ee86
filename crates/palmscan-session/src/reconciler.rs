//! Drawing reconciler
//!
//! The rendering surface reports the full list of drawings on every
//! interaction and has no notion of which ones are new. The reconciler
//! compares that list against the region store and picks at most one action
//! per cycle.
//!
//! Only the last drawing is compared. This assumes drawings are appended one
//! at a time or cleared all at once; edits to earlier drawings are invisible.

use crate::store::SessionState;
use palmscan_core::{Detection, Drawing, SessionError, SessionResult};
use tracing::{debug, info, warn};

/// Action chosen for one reconciliation cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Nothing changed since the last processed drawing
    NoOp,
    /// All drawings were removed; the store has been cleared
    Reset,
    /// The last drawing is new and must go through inference
    ProcessLast(Drawing),
}

impl Reconciliation {
    /// Whether the caller must redraw the overlay after this action
    pub fn requests_refresh(&self) -> bool {
        !matches!(self, Reconciliation::NoOp)
    }
}

/// Decide what a snapshot means for the store, without mutating anything.
///
/// `None` and an empty list are treated the same. Growth and shrinkage are
/// measured against the last snapshot a cycle completed for, since the store
/// stops mirroring the drawing count once a snapshot carries a replaced or
/// more than one new drawing.
pub fn decide<D: Detection>(
    state: &SessionState<D>,
    drawings: Option<&[Drawing]>,
) -> SessionResult<Reconciliation> {
    let store = state.store();
    let previous = state.last_seen().len();
    let drawings = drawings.unwrap_or_default();

    let Some(newest) = drawings.last() else {
        return Ok(if store.is_empty() {
            Reconciliation::NoOp
        } else {
            Reconciliation::Reset
        });
    };

    if store.last().is_some_and(|r| r.drawing() == newest) {
        return Ok(Reconciliation::NoOp);
    }

    if drawings.len() < previous {
        return Err(SessionError::UndefinedReconciliationState {
            drawings: drawings.len(),
            previous,
        });
    }

    if drawings.len() > previous + 1 {
        warn!(
            drawings = drawings.len(),
            previous,
            "More than one new drawing in a single snapshot; only the last is processed"
        );
    }

    Ok(Reconciliation::ProcessLast(newest.clone()))
}

/// Run the decision and apply a reset to the store when required
pub fn reconcile<D: Detection>(
    state: &mut SessionState<D>,
    drawings: Option<&[Drawing]>,
) -> SessionResult<Reconciliation> {
    let decision = decide(state, drawings)?;
    match &decision {
        Reconciliation::NoOp => debug!("Reconcile: no new drawing"),
        Reconciliation::Reset => {
            let dropped = state.store_mut().reset();
            info!(dropped, "Reconcile: drawings cleared, region store reset");
        }
        Reconciliation::ProcessLast(_) => {
            info!(
                regions = state.store().len(),
                "Reconcile: new drawing to process"
            );
        }
    }
    Ok(decision)
}
