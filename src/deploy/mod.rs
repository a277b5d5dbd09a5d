// ABOUTME: Multi-region deployment: immutable descriptor, concurrent fan-out, aggregated summary.
// ABOUTME: Each region is reconciled independently against its own platform client.

mod descriptor;
mod orchestrator;
mod summary;

pub use descriptor::DeploymentDescriptor;
pub use orchestrator::deploy;
pub use summary::DeploySummary;
