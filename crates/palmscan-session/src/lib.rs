//! # Palmscan Session
//!
//! Incremental region reconciliation for one user survey session.
//!
//! ## Cycle
//!
//! ```text
//! drawings snapshot
//!   └── reconciler      NoOp | Reset | ProcessLast(drawing)
//!         └── invoker   geometry → inference → predictions → persistence
//!               └── region store (append-only, full reset)
//!                     └── metrics / overlay (read-only)
//! ```
//!
//! Each cycle runs to completion before the next one starts. Inference is
//! the only blocking step and runs at most once per drawing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palmscan_session::Session;
//!
//! let mut session = Session::new(pipeline);
//! let report = session.cycle(Some(&drawings))?;
//! if report.refresh_requested {
//!     redraw(session.overlay("Predictions", &style));
//! }
//! ```

pub mod invoker;
pub mod metrics;
pub mod overlay;
pub mod reconciler;
pub mod session;
pub mod sink;
pub mod store;

pub use invoker::{InferenceInvoker, Invocation, PersistenceStatus};
pub use metrics::SessionMetrics;
pub use overlay::OverlayLayer;
pub use reconciler::{decide, reconcile, Reconciliation};
pub use session::{CycleAction, CycleReport, Session};
pub use sink::{JsonLinesSink, PersistedRegion};
pub use store::{RegionStore, SessionState};
