// ABOUTME: Event-source and schedule binding types shared by loader and reconciler.
// ABOUTME: Event sources are keyed by source ARN; schedules are keyed by rule name.

use crate::types::MappingId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// Where a stream subscription starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartingPosition {
    #[default]
    Latest,
    TrimHorizon,
}

impl StartingPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartingPosition::Latest => "LATEST",
            StartingPosition::TrimHorizon => "TRIM_HORIZON",
        }
    }
}

impl FromStr for StartingPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "latest" => Ok(StartingPosition::Latest),
            "trim_horizon" => Ok(StartingPosition::TrimHorizon),
            other => Err(format!(
                "invalid starting position '{other}' (expected LATEST or TRIM_HORIZON)"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for StartingPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for StartingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription wiring a stream or queue to the function.
///
/// `remote_id` is only set on bindings observed on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSourceBinding {
    pub source_arn: String,
    pub enabled: bool,
    pub batch_size: u32,
    pub starting_position: Option<StartingPosition>,
    pub remote_id: Option<MappingId>,
}

impl EventSourceBinding {
    /// A desired binding with loader defaults applied.
    pub fn new(source_arn: impl Into<String>) -> Self {
        Self {
            source_arn: source_arn.into(),
            enabled: false,
            batch_size: DEFAULT_BATCH_SIZE,
            starting_position: Some(StartingPosition::Latest),
            remote_id: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn starting_position(mut self, position: Option<StartingPosition>) -> Self {
        self.starting_position = position;
        self
    }

    pub fn with_remote_id(mut self, id: MappingId) -> Self {
        self.remote_id = Some(id);
        self
    }
}

/// Time-based rule that invokes the function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleBinding {
    pub rule_name: String,
    pub schedule_expression: String,
    pub enabled: bool,
    pub description: Option<String>,
    /// JSON document delivered to the function as the event.
    pub target_input: Option<String>,
}

impl ScheduleBinding {
    pub fn new(rule_name: impl Into<String>, schedule_expression: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            schedule_expression: schedule_expression.into(),
            enabled: true,
            description: None,
            target_input: None,
        }
    }
}
