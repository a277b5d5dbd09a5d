// ABOUTME: Function settings from the `function` section of lambdeploy.yml.
// ABOUTME: Runtime, handler, sizing, networking, tracing and environment variables.

use super::deserialize::deserialize_runtime;
use super::env_value::EnvValue;
use crate::types::RuntimeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const MEMORY_RANGE_MB: std::ops::RangeInclusive<u32> = 128..=10240;
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=900;

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    pub name: String,

    #[serde(deserialize_with = "deserialize_runtime")]
    pub runtime: RuntimeId,

    #[serde(default = "default_handler")]
    pub handler: String,

    pub role: String,

    #[serde(default = "default_memory_size")]
    pub memory_size: u32,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub publish: bool,

    /// Environment suffix appended to the deployed name. Usually set through
    /// `--environment` rather than in the file.
    #[serde(default)]
    pub environment: Option<String>,

    /// Version suffix appended after the environment.
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub vpc: Option<VpcConfig>,

    #[serde(default)]
    pub dead_letter_target: Option<String>,

    #[serde(default)]
    pub tracing: Option<TracingMode>,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,
}

fn default_handler() -> String {
    "index.handler".to_string()
}

fn default_memory_size() -> u32 {
    128
}

fn default_timeout() -> Duration {
    Duration::from_secs(3)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct VpcConfig {
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
}

impl VpcConfig {
    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty() && self.security_groups.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TracingMode {
    Active,
    PassThrough,
}

impl TracingMode {
    /// Name used by the platform API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TracingMode::Active => "Active",
            TracingMode::PassThrough => "PassThrough",
        }
    }
}
