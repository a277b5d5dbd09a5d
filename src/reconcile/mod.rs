// ABOUTME: Per-region reconciliation of remote function state using the type state pattern.
// ABOUTME: Probe, create or update the function, converge bindings, then upsert schedules.

mod diff;
mod error;
mod outcome;
mod reconciliation;
mod schedule;
mod state;

pub use diff::{BindingOp, plan};
pub use error::ReconcileError;
pub use outcome::{
    BindingAction, BindingOutcome, FunctionChange, RegionResult, ScheduleOutcome, ScheduleStatus,
};
pub use reconciliation::{Reconciliation, reconcile};
pub use schedule::apply_schedules;
pub use state::{BindingsApplied, FunctionReady, Probed};
