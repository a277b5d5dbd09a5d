// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::deploy::DeploySummary;
use crate::reconcile::{RegionResult, ScheduleStatus};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a non-fatal warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => emit_stderr(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit_stdout(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit_stderr(&JsonEvent {
                event: "error",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print the per-region results of a deploy. Nothing is printed when the
    /// deploy changed nothing.
    pub fn summary(&self, summary: &DeploySummary) {
        if summary.is_noop() {
            return;
        }

        match self.mode {
            OutputMode::Normal => {
                for region in &summary.regions {
                    for line in region_lines(region) {
                        println!("{line}");
                    }
                }
            }
            OutputMode::Quiet => {
                for region in summary.regions.iter().filter(|r| r.is_failed()) {
                    for line in region_lines(region) {
                        eprintln!("{line}");
                    }
                }
            }
            OutputMode::Json => emit_stdout(&SummaryEvent {
                event: "summary",
                summary,
            }),
        }
    }
}

/// Human-readable lines describing one region.
pub fn region_lines(region: &RegionResult) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(error) = &region.error {
        lines.push(format!("  ✗ {}: {}", region.region, error));
        return lines;
    }

    let change = region
        .function_change
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unchanged".to_string());
    match &region.function_arn {
        Some(arn) => lines.push(format!("  ✓ {}: function {} ({})", region.region, change, arn)),
        None => lines.push(format!("  ✓ {}: function {}", region.region, change)),
    }

    for outcome in &region.event_sources {
        match &outcome.error {
            None => lines.push(format!("    {} {}", outcome.action, outcome.target)),
            Some(e) => lines.push(format!("    ✗ {} {}: {}", outcome.action, outcome.target, e)),
        }
    }

    for outcome in &region.schedules {
        let line = match &outcome.status {
            ScheduleStatus::Applied { .. } => format!("    schedule {}", outcome.rule_name),
            ScheduleStatus::Failed { error } => {
                format!("    ✗ schedule {}: {}", outcome.rule_name, error)
            }
            ScheduleStatus::Skipped => format!("    - schedule {} skipped", outcome.rule_name),
        };
        lines.push(line);
    }

    lines
}

fn emit_stdout<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_stderr<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct SummaryEvent<'a> {
    event: &'a str,
    summary: &'a DeploySummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Operation, PlatformError};
    use crate::reconcile::{BindingAction, BindingOutcome, FunctionChange, ScheduleOutcome};
    use crate::types::{FunctionArn, MappingId, Region};

    #[test]
    fn failed_region_is_one_line() {
        let region = RegionResult::failed(
            Region::new("eu-west-1").unwrap(),
            PlatformError::api(Operation::GetFunction, "denied"),
        );
        let lines = region_lines(&region);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("eu-west-1"));
        assert!(lines[0].contains("denied"));
    }

    #[test]
    fn reconciled_region_lists_every_outcome() {
        let region = RegionResult {
            region: Region::new("us-east-1").unwrap(),
            function_change: Some(FunctionChange::Updated),
            function_arn: Some(FunctionArn::new("arn:fn")),
            event_sources: vec![BindingOutcome {
                action: BindingAction::Delete,
                target: "u2".to_string(),
                remote_id: Some(MappingId::new("u2")),
                error: None,
            }],
            schedules: vec![ScheduleOutcome::skipped("nightly")],
            error: None,
        };

        let lines = region_lines(&region);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("updated"));
        assert_eq!(lines[1], "    delete u2");
        assert!(lines[2].contains("skipped"));
    }
}
