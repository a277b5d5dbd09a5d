// ABOUTME: Reconciliation state types for the type state pattern.
// ABOUTME: Each state carries the data its successor needs, so missing steps fail to compile.

use super::outcome::{BindingOutcome, FunctionChange};
use crate::desired::EventSourceBinding;
use crate::types::FunctionArn;

/// Probed: function existence is known.
/// Available actions: `ensure_function()`
#[derive(Debug)]
pub struct Probed {
    pub(crate) existing: Option<FunctionArn>,
}

impl Probed {
    /// ARN of the function if it already exists.
    pub fn existing(&self) -> Option<&FunctionArn> {
        self.existing.as_ref()
    }
}

/// Function ready: created or updated, existing bindings listed.
/// Available actions: `apply_bindings()`
#[derive(Debug)]
pub struct FunctionReady {
    pub(crate) arn: FunctionArn,
    pub(crate) change: FunctionChange,
    pub(crate) existing_bindings: Vec<EventSourceBinding>,
}

/// Bindings applied: every binding operation has an outcome.
/// Available actions: `apply_schedules()`
#[derive(Debug)]
pub struct BindingsApplied {
    pub(crate) arn: FunctionArn,
    pub(crate) change: FunctionChange,
    pub(crate) outcomes: Vec<BindingOutcome>,
}
