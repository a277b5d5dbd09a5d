// ABOUTME: Composable capability traits for the remote function platform.
// ABOUTME: Defines FunctionOps, EventSourceOps, ScheduleOps, Platform and Connector.

use super::context::RegionContext;
use super::error::{ConnectError, PlatformError};
use crate::deploy::DeploymentDescriptor;
use crate::desired::{EventSourceBinding, ScheduleBinding};
use crate::types::{FunctionArn, FunctionName, MappingId, RuleArn};
use async_trait::async_trait;

pub(crate) mod sealed {
    /// Only platform clients defined in this crate may implement the capability
    /// traits, so methods can be added without breaking downstream code.
    pub trait Sealed {}
}

/// Function lifecycle operations.
#[async_trait]
pub trait FunctionOps: sealed::Sealed + Send + Sync {
    /// Look the function up by name. `Ok(None)` means it does not exist.
    async fn get_function(&self, name: &FunctionName)
    -> Result<Option<FunctionArn>, PlatformError>;

    /// Create the function with code and configuration in one call.
    async fn create_function(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<FunctionArn, PlatformError>;

    /// Replace the function's code with the descriptor's artifact.
    async fn update_function_code(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PlatformError>;

    /// Replace the function's configuration with the descriptor's settings.
    async fn update_function_configuration(
        &self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PlatformError>;
}

/// Event-source binding operations.
#[async_trait]
pub trait EventSourceOps: sealed::Sealed + Send + Sync {
    /// List bindings currently attached to the function. Every returned binding
    /// carries its `remote_id`.
    async fn list_event_sources(
        &self,
        function: &FunctionName,
    ) -> Result<Vec<EventSourceBinding>, PlatformError>;

    async fn create_event_source(
        &self,
        function: &FunctionName,
        binding: &EventSourceBinding,
    ) -> Result<MappingId, PlatformError>;

    async fn update_event_source(
        &self,
        function: &FunctionName,
        binding: &EventSourceBinding,
        id: &MappingId,
    ) -> Result<(), PlatformError>;

    async fn delete_event_source(&self, id: &MappingId) -> Result<(), PlatformError>;
}

/// Schedule rule operations.
#[async_trait]
pub trait ScheduleOps: sealed::Sealed + Send + Sync {
    /// Create or replace the rule named by `schedule` and point it at the function.
    async fn upsert_schedule(
        &self,
        function: &FunctionArn,
        schedule: &ScheduleBinding,
    ) -> Result<RuleArn, PlatformError>;
}

/// Every capability the reconciler needs. Implemented automatically.
pub trait Platform: FunctionOps + EventSourceOps + ScheduleOps {}

impl<T: FunctionOps + EventSourceOps + ScheduleOps> Platform for T {}

/// Produces a platform client bound to one region.
#[async_trait]
pub trait Connector: Send + Sync {
    type Platform: Platform;

    async fn connect(&self, context: &RegionContext) -> Result<Self::Platform, ConnectError>;
}
