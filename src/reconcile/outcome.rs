// ABOUTME: Per-region reconciliation results reported after all regions finish.
// ABOUTME: Binding and schedule outcomes are kept in the order their operations were planned.

use super::error::ReconcileError;
use crate::platform::PlatformError;
use crate::types::{FunctionArn, MappingId, Region, RuleArn};
use serde::{Serialize, Serializer};
use std::fmt;

/// What happened to the function itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionChange {
    Created,
    Updated,
}

impl fmt::Display for FunctionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionChange::Created => f.write_str("created"),
            FunctionChange::Updated => f.write_str("updated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for BindingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingAction::Create => f.write_str("create"),
            BindingAction::Update => f.write_str("update"),
            BindingAction::Delete => f.write_str("delete"),
        }
    }
}

/// Result of one event-source operation.
#[derive(Debug, Serialize)]
pub struct BindingOutcome {
    pub action: BindingAction,
    /// Source ARN for create/update, mapping id for delete.
    pub target: String,
    pub remote_id: Option<MappingId>,
    #[serde(serialize_with = "optional_message")]
    pub error: Option<PlatformError>,
}

impl BindingOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScheduleStatus {
    Applied {
        rule_arn: RuleArn,
    },
    Failed {
        #[serde(serialize_with = "message")]
        error: PlatformError,
    },
    /// Not attempted because an earlier rule failed.
    Skipped,
}

/// Result of one schedule upsert.
#[derive(Debug, Serialize)]
pub struct ScheduleOutcome {
    pub rule_name: String,
    #[serde(flatten)]
    pub status: ScheduleStatus,
}

impl ScheduleOutcome {
    pub fn applied(rule_name: impl Into<String>, rule_arn: RuleArn) -> Self {
        Self {
            rule_name: rule_name.into(),
            status: ScheduleStatus::Applied { rule_arn },
        }
    }

    pub fn failed(rule_name: impl Into<String>, error: PlatformError) -> Self {
        Self {
            rule_name: rule_name.into(),
            status: ScheduleStatus::Failed { error },
        }
    }

    pub fn skipped(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            status: ScheduleStatus::Skipped,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.status, ScheduleStatus::Applied { .. })
    }
}

/// Terminal result of reconciling one region.
#[derive(Debug, Serialize)]
pub struct RegionResult {
    pub region: Region,
    pub function_change: Option<FunctionChange>,
    pub function_arn: Option<FunctionArn>,
    pub event_sources: Vec<BindingOutcome>,
    pub schedules: Vec<ScheduleOutcome>,
    #[serde(serialize_with = "optional_message")]
    pub error: Option<ReconcileError>,
}

impl RegionResult {
    /// A region that failed before any binding or schedule work.
    pub fn failed(region: Region, error: impl Into<ReconcileError>) -> Self {
        Self {
            region,
            function_change: None,
            function_arn: None,
            event_sources: Vec::new(),
            schedules: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Binding or schedule operations that reported an error.
    pub fn partial_failures(&self) -> usize {
        let bindings = self.event_sources.iter().filter(|o| !o.is_ok()).count();
        let schedules = self
            .schedules
            .iter()
            .filter(|o| matches!(o.status, ScheduleStatus::Failed { .. }))
            .count();
        bindings + schedules
    }

    /// Nothing was changed and nothing went wrong.
    pub fn is_noop(&self) -> bool {
        self.function_change.is_none()
            && self.event_sources.is_empty()
            && self.schedules.is_empty()
            && self.error.is_none()
    }
}

fn message<S: Serializer, E: fmt::Display>(error: &E, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

fn optional_message<S: Serializer, E: fmt::Display>(
    error: &Option<E>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.collect_str(error),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Operation;

    fn region() -> Region {
        Region::new("us-east-1").unwrap()
    }

    #[test]
    fn failed_region_is_not_a_noop() {
        let result = RegionResult::failed(
            region(),
            PlatformError::api(Operation::GetFunction, "denied"),
        );
        assert!(result.is_failed());
        assert!(!result.is_noop());
    }

    #[test]
    fn schedule_outcome_serializes_status_inline() {
        let outcome = ScheduleOutcome::skipped("nightly");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["rule_name"], "nightly");
        assert_eq!(json["status"], "skipped");

        let outcome = ScheduleOutcome::failed(
            "hourly",
            PlatformError::api(Operation::UpsertSchedule, "throttled"),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "upsert schedule failed: throttled");
    }

    #[test]
    fn partial_failures_count_bindings_and_schedules() {
        let result = RegionResult {
            region: region(),
            function_change: Some(FunctionChange::Updated),
            function_arn: None,
            event_sources: vec![
                BindingOutcome {
                    action: BindingAction::Create,
                    target: "arn:a".into(),
                    remote_id: None,
                    error: Some(PlatformError::api(Operation::CreateEventSource, "x")),
                },
                BindingOutcome {
                    action: BindingAction::Delete,
                    target: "u1".into(),
                    remote_id: Some(MappingId::new("u1")),
                    error: None,
                },
            ],
            schedules: vec![
                ScheduleOutcome::failed("a", PlatformError::api(Operation::UpsertSchedule, "x")),
                ScheduleOutcome::skipped("b"),
            ],
            error: None,
        };
        assert_eq!(result.partial_failures(), 2);
        assert!(!result.is_failed());
    }
}
