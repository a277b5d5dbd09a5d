// ABOUTME: Per-region reconciliation parameterized by its current state.
// ABOUTME: Each transition consumes self and returns the next state on success.

use super::diff::{BindingOp, plan};
use super::outcome::{BindingAction, BindingOutcome, FunctionChange, RegionResult};
use super::schedule::apply_schedules;
use super::state::{BindingsApplied, FunctionReady, Probed};
use crate::deploy::DeploymentDescriptor;
use crate::desired::{DesiredState, EventSourceBinding, ScheduleBinding};
use crate::platform::{EventSourceOps, FunctionOps, Platform, PlatformError, ScheduleOps};
use crate::types::{FunctionName, Region};
use futures::future::join_all;
use std::sync::Arc;

/// A region being reconciled, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (the function ARN,
/// listed bindings, outcomes) so later steps cannot run before earlier ones.
#[derive(Debug)]
pub struct Reconciliation<S> {
    pub(crate) region: Region,
    pub(crate) descriptor: Arc<DeploymentDescriptor>,
    pub(crate) state: S,
}

impl<S> Reconciliation<S> {
    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn descriptor(&self) -> &DeploymentDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    fn transition<T>(self, state: T) -> Reconciliation<T> {
        Reconciliation {
            region: self.region,
            descriptor: self.descriptor,
            state,
        }
    }
}

// =============================================================================
// Start -> Probed
// =============================================================================

impl Reconciliation<Probed> {
    /// Look the function up by name.
    ///
    /// # Errors
    ///
    /// Returns the platform error if the lookup itself fails.
    #[must_use = "reconciliation state must be used"]
    pub async fn probe<P: FunctionOps>(
        platform: &P,
        region: Region,
        descriptor: Arc<DeploymentDescriptor>,
    ) -> Result<Self, PlatformError> {
        let existing = platform.get_function(&descriptor.function_name).await?;
        tracing::debug!(
            region = %region,
            "Function {} {}",
            descriptor.function_name,
            if existing.is_some() { "exists" } else { "not found" }
        );

        Ok(Reconciliation {
            region,
            descriptor,
            state: Probed { existing },
        })
    }

    /// Create the function, or update its code then configuration while listing
    /// the bindings already attached to it.
    ///
    /// # Errors
    ///
    /// Returns the first platform error from create, update or list.
    #[must_use = "reconciliation state must be used"]
    pub async fn ensure_function<P: FunctionOps + EventSourceOps>(
        self,
        platform: &P,
    ) -> Result<Reconciliation<FunctionReady>, PlatformError> {
        let name = &self.descriptor.function_name;

        let Some(arn) = self.state.existing.clone() else {
            tracing::info!(region = %self.region, "Creating function {}", name);
            let arn = platform.create_function(&self.descriptor).await?;
            let ready = FunctionReady {
                arn,
                change: FunctionChange::Created,
                existing_bindings: Vec::new(),
            };
            return Ok(self.transition(ready));
        };

        tracing::info!(region = %self.region, "Updating function {}", name);
        let update = async {
            platform.update_function_code(&self.descriptor).await?;
            platform.update_function_configuration(&self.descriptor).await
        };
        let (updated, listed) = tokio::join!(update, platform.list_event_sources(name));
        updated?;
        let existing_bindings = listed?;

        let ready = FunctionReady {
            arn,
            change: FunctionChange::Updated,
            existing_bindings,
        };
        Ok(self.transition(ready))
    }
}

// =============================================================================
// FunctionReady -> BindingsApplied
// =============================================================================

impl Reconciliation<FunctionReady> {
    /// Diff `desired` against the listed bindings and apply every operation
    /// concurrently. Individual failures are recorded, never escalated.
    #[must_use = "reconciliation state must be used"]
    pub async fn apply_bindings<P: EventSourceOps>(
        self,
        platform: &P,
        desired: &[EventSourceBinding],
    ) -> Reconciliation<BindingsApplied> {
        let ops = plan(desired, &self.state.existing_bindings);
        tracing::debug!(
            region = %self.region,
            "{} event source operation(s) planned",
            ops.len()
        );

        let name = &self.descriptor.function_name;
        let outcomes = join_all(ops.into_iter().map(|op| apply_op(platform, name, op))).await;

        let applied = BindingsApplied {
            arn: self.state.arn.clone(),
            change: self.state.change,
            outcomes,
        };
        self.transition(applied)
    }
}

async fn apply_op<P: EventSourceOps>(
    platform: &P,
    function: &FunctionName,
    op: BindingOp,
) -> BindingOutcome {
    match op {
        BindingOp::Create(binding) => {
            let result = platform.create_event_source(function, &binding).await;
            let (remote_id, error) = match result {
                Ok(id) => (Some(id), None),
                Err(e) => (None, Some(e)),
            };
            BindingOutcome {
                action: BindingAction::Create,
                target: binding.source_arn,
                remote_id,
                error,
            }
        }
        BindingOp::Update(binding, id) => {
            let error = platform
                .update_event_source(function, &binding, &id)
                .await
                .err();
            BindingOutcome {
                action: BindingAction::Update,
                target: binding.source_arn,
                remote_id: Some(id),
                error,
            }
        }
        BindingOp::Delete(id) => {
            let error = platform.delete_event_source(&id).await.err();
            BindingOutcome {
                action: BindingAction::Delete,
                target: id.to_string(),
                remote_id: Some(id),
                error,
            }
        }
    }
}

// =============================================================================
// BindingsApplied -> RegionResult
// =============================================================================

impl Reconciliation<BindingsApplied> {
    /// Upsert schedules in order and produce the region's terminal result.
    pub async fn apply_schedules<P: ScheduleOps>(
        self,
        platform: &P,
        schedules: &[ScheduleBinding],
    ) -> RegionResult {
        let outcomes = apply_schedules(platform, &self.state.arn, schedules).await;

        RegionResult {
            region: self.region,
            function_change: Some(self.state.change),
            function_arn: Some(self.state.arn),
            event_sources: self.state.outcomes,
            schedules: outcomes,
            error: None,
        }
    }
}

/// Drive one region through every state and collect its result.
pub async fn reconcile<P: Platform>(
    platform: &P,
    region: Region,
    descriptor: Arc<DeploymentDescriptor>,
    desired: &DesiredState,
) -> RegionResult {
    let probed = match Reconciliation::probe(platform, region.clone(), descriptor).await {
        Ok(probed) => probed,
        Err(e) => {
            tracing::error!(region = %region, "Probe failed: {}", e);
            return RegionResult::failed(region, e);
        }
    };

    let ready = match probed.ensure_function(platform).await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(region = %region, "Function deploy failed: {}", e);
            return RegionResult::failed(region, e);
        }
    };

    ready
        .apply_bindings(platform, &desired.event_sources)
        .await
        .apply_schedules(platform, &desired.schedules)
        .await
}
