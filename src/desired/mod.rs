// ABOUTME: Loads the locally declared event-source and schedule bindings.
// ABOUTME: Accepts the legacy bare-list form and the structured two-collection document.

mod binding;

pub use binding::{DEFAULT_BATCH_SIZE, EventSourceBinding, ScheduleBinding, StartingPosition};

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesiredStateError {
    #[error("failed to read event sources from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid event sources document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("event sources document must be a list or a mapping, found {0}")]
    UnexpectedShape(&'static str),

    #[error("event source ARN cannot be empty")]
    EmptySourceArn,

    #[error("duplicate event source: {0}")]
    DuplicateSource(String),

    #[error("invalid schedule input for rule {rule}: {message}")]
    ScheduleInput { rule: String, message: String },
}

/// Bindings the deployment should converge each region to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub event_sources: Vec<EventSourceBinding>,
    pub schedules: Vec<ScheduleBinding>,
}

impl DesiredState {
    /// Load bindings from `path`. No path means no bindings are managed.
    pub fn load(path: Option<&Path>) -> Result<Self, DesiredStateError> {
        let Some(path) = path else {
            tracing::debug!("No event sources file configured");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| DesiredStateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let state = Self::from_document(&content)?;

        tracing::debug!(
            "Loaded {} event source(s) and {} schedule(s) from {}",
            state.event_sources.len(),
            state.schedules.len(),
            path.display()
        );
        Ok(state)
    }

    /// Parse a JSON or YAML document.
    pub fn from_document(content: &str) -> Result<Self, DesiredStateError> {
        let value: Value = serde_yaml::from_str(content)?;

        let document = match value {
            Value::Null => StructuredDocument::default(),
            Value::Sequence(_) => StructuredDocument {
                event_source_mappings: serde_yaml::from_value(value)?,
                schedule_events: Vec::new(),
            },
            Value::Mapping(_) => serde_yaml::from_value(value)?,
            Value::Bool(_) => return Err(DesiredStateError::UnexpectedShape("a boolean")),
            Value::Number(_) => return Err(DesiredStateError::UnexpectedShape("a number")),
            Value::String(_) => return Err(DesiredStateError::UnexpectedShape("a string")),
            Value::Tagged(_) => return Err(DesiredStateError::UnexpectedShape("a tagged value")),
        };

        document.into_state()
    }

    pub fn is_empty(&self) -> bool {
        self.event_sources.is_empty() && self.schedules.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StructuredDocument {
    #[serde(default)]
    event_source_mappings: Vec<EventSourceEntry>,
    #[serde(default)]
    schedule_events: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EventSourceEntry {
    event_source_arn: String,
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_batch_size")]
    batch_size: u32,
    #[serde(default)]
    starting_position: StartingPosition,
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScheduleEntry {
    schedule_name: String,
    schedule_expression: String,
    #[serde(default = "default_schedule_state")]
    schedule_state: String,
    #[serde(default)]
    schedule_description: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

fn default_schedule_state() -> String {
    "ENABLED".to_string()
}

impl StructuredDocument {
    fn into_state(self) -> Result<DesiredState, DesiredStateError> {
        let mut seen = HashSet::new();
        let mut event_sources = Vec::with_capacity(self.event_source_mappings.len());

        for entry in self.event_source_mappings {
            if entry.event_source_arn.trim().is_empty() {
                return Err(DesiredStateError::EmptySourceArn);
            }
            if !seen.insert(entry.event_source_arn.clone()) {
                return Err(DesiredStateError::DuplicateSource(entry.event_source_arn));
            }

            event_sources.push(
                EventSourceBinding::new(entry.event_source_arn)
                    .enabled(entry.enabled)
                    .batch_size(entry.batch_size)
                    .starting_position(Some(entry.starting_position)),
            );
        }

        let schedules = self
            .schedule_events
            .into_iter()
            .map(ScheduleEntry::into_binding)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DesiredState {
            event_sources,
            schedules,
        })
    }
}

impl ScheduleEntry {
    fn into_binding(self) -> Result<ScheduleBinding, DesiredStateError> {
        // Input may be written inline as a mapping; the platform wants a JSON string.
        let target_input = match self.input {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw),
            Some(other) => Some(serde_json::to_string(&other).map_err(|e| {
                DesiredStateError::ScheduleInput {
                    rule: self.schedule_name.clone(),
                    message: e.to_string(),
                }
            })?),
        };

        Ok(ScheduleBinding {
            enabled: !self.schedule_state.eq_ignore_ascii_case("disabled"),
            rule_name: self.schedule_name,
            schedule_expression: self.schedule_expression,
            description: self.schedule_description,
            target_input,
        })
    }
}
