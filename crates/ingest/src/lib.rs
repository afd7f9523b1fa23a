//! Background ingestion into render-owned state.
//!
//! Producer threads never touch the state they feed. They hand the owner a
//! pure transform through a [`StateHandle`] and raise a render request; the
//! render loop applies queued transforms against the current value when it
//! next runs.

mod cell;
mod worker;

pub use cell::{StateCell, StateHandle, Transform};
pub use worker::{IngestOutcome, IngestSummary, IngestTarget, IngestWorker, WorkerState};
