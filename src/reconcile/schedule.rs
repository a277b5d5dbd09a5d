// ABOUTME: Ordered schedule upserts for one region.
// ABOUTME: The first failure halts the fold and the remaining rules are reported as skipped.

use super::outcome::ScheduleOutcome;
use crate::desired::ScheduleBinding;
use crate::platform::ScheduleOps;
use crate::types::FunctionArn;
use futures::stream::{self, StreamExt};

/// Upsert `schedules` one at a time in declared order.
pub async fn apply_schedules<P: ScheduleOps>(
    platform: &P,
    function: &FunctionArn,
    schedules: &[ScheduleBinding],
) -> Vec<ScheduleOutcome> {
    let (outcomes, _halted) = stream::iter(schedules)
        .fold(
            (Vec::with_capacity(schedules.len()), false),
            |(mut outcomes, halted), schedule| async move {
                if halted {
                    outcomes.push(ScheduleOutcome::skipped(&schedule.rule_name));
                    return (outcomes, true);
                }

                tracing::debug!("Upserting schedule {}", schedule.rule_name);
                match platform.upsert_schedule(function, schedule).await {
                    Ok(rule_arn) => {
                        outcomes.push(ScheduleOutcome::applied(&schedule.rule_name, rule_arn));
                        (outcomes, false)
                    }
                    Err(e) => {
                        tracing::warn!("Schedule {} failed: {}", schedule.rule_name, e);
                        outcomes.push(ScheduleOutcome::failed(&schedule.rule_name, e));
                        (outcomes, true)
                    }
                }
            },
        )
        .await;

    outcomes
}
