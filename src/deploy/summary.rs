// ABOUTME: Aggregated result of a multi-region deploy.
// ABOUTME: Region order matches the order regions were requested in.

use crate::reconcile::RegionResult;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeploySummary {
    pub regions: Vec<RegionResult>,
}

impl DeploySummary {
    pub fn new(regions: Vec<RegionResult>) -> Self {
        Self { regions }
    }

    /// True when no region changed anything or reported an error.
    pub fn is_noop(&self) -> bool {
        self.regions.iter().all(RegionResult::is_noop)
    }

    /// Regions that failed outright.
    pub fn failed(&self) -> usize {
        self.regions.iter().filter(|r| r.is_failed()).count()
    }

    pub fn total(&self) -> usize {
        self.regions.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}
