// ABOUTME: Fans reconciliation out across regions concurrently.
// ABOUTME: One region's failure never blocks or rolls back another.

use super::descriptor::DeploymentDescriptor;
use super::summary::DeploySummary;
use crate::desired::DesiredState;
use crate::platform::{ClientSettings, Connector, Credentials, RegionContext};
use crate::reconcile::{RegionResult, reconcile};
use crate::types::Region;
use futures::future::join_all;
use std::sync::Arc;

/// Reconcile every region in `regions` and wait for all of them.
pub async fn deploy<C: Connector>(
    connector: &C,
    regions: &[Region],
    credentials: &Credentials,
    settings: ClientSettings,
    descriptor: Arc<DeploymentDescriptor>,
    desired: &DesiredState,
) -> DeploySummary {
    tracing::info!(
        "Deploying {} to {} region(s)",
        descriptor.function_name,
        regions.len()
    );

    let tasks = regions.iter().map(|region| {
        let context = RegionContext::new(region.clone(), credentials.clone(), settings.clone());
        deploy_region(connector, context, Arc::clone(&descriptor), desired)
    });

    DeploySummary::new(join_all(tasks).await)
}

async fn deploy_region<C: Connector>(
    connector: &C,
    context: RegionContext,
    descriptor: Arc<DeploymentDescriptor>,
    desired: &DesiredState,
) -> RegionResult {
    let region = context.region().clone();

    let platform = match connector.connect(&context).await {
        Ok(platform) => platform,
        Err(e) => {
            tracing::error!(region = %region, "Connection failed: {}", e);
            return RegionResult::failed(region, e);
        }
    };

    let result = reconcile(&platform, region, descriptor, desired).await;
    if result.is_failed() {
        tracing::warn!(region = %result.region, "Region failed");
    } else {
        tracing::info!(region = %result.region, "Region reconciled");
    }
    result
}
