// ABOUTME: Deploy command implementation.
// ABOUTME: Validates inputs, builds the artifact once, then reconciles every region.

use bytes::Bytes;
use lambdeploy::build::build;
use lambdeploy::config::Config;
use lambdeploy::deploy::{DeploySummary, DeploymentDescriptor, deploy as deploy_regions};
use lambdeploy::desired::DesiredState;
use lambdeploy::diagnostics::Diagnostics;
use lambdeploy::error::{Error, Result};
use lambdeploy::output::Output;
use lambdeploy::platform::{AwsConnector, InMemoryConnector};
use lambdeploy::types::Region;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build once and deploy to all configured regions.
pub async fn deploy(
    config: Config,
    base: &Path,
    event_sources: Option<PathBuf>,
    dry_run: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    // Everything that can fail without side effects runs before the build.
    let desired_path = event_sources.or_else(|| config.event_sources_path(base));
    let desired = DesiredState::load(desired_path.as_deref())?;
    let credentials = config.credentials()?;
    let descriptor = DeploymentDescriptor::from_config(&config, Bytes::new())?;
    let regions: Vec<Region> = config.deploy.regions.iter().cloned().collect();

    output.progress(&format!("Building {}...", descriptor.function_name));
    let artifact = build(&config.build_request(base), &mut diag).await?;
    output.progress(&format!("  → Artifact ready ({} bytes)", artifact.len()));

    let descriptor = Arc::new(descriptor.with_artifact(artifact.into_bytes()));

    output.progress(&format!(
        "Deploying {} to {} region(s){}",
        descriptor.function_name,
        regions.len(),
        if dry_run { " (dry run)" } else { "" }
    ));

    let settings = config.client_settings();
    let summary: DeploySummary = if dry_run {
        let connector = InMemoryConnector::new();
        deploy_regions(&connector, &regions, &credentials, settings, descriptor, &desired).await
    } else {
        let connector = AwsConnector::new();
        deploy_regions(&connector, &regions, &credentials, settings, descriptor, &desired).await
    };

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.summary(&summary);

    if !summary.is_success() {
        return Err(Error::DeployFailed {
            failed: summary.failed(),
            total: summary.total(),
        });
    }

    if !summary.is_noop() {
        output.success("Deployment complete!");
    }
    Ok(())
}
