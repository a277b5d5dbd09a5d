// ABOUTME: Immutable description of the function being deployed.
// ABOUTME: Built once from configuration plus the artifact, then shared by every region.

use crate::config::{Config, TracingMode, VpcConfig, resolve_env_map};
use crate::error::Result;
use crate::types::{FunctionName, RuntimeId};
use bytes::Bytes;
use std::collections::BTreeMap;

/// Function code and settings shipped identically to every region.
#[derive(Debug, Clone)]
pub struct DeploymentDescriptor {
    pub function_name: FunctionName,
    pub runtime: RuntimeId,
    pub handler: String,
    pub memory_size: u32,
    pub timeout_secs: u32,
    pub role: String,
    pub description: String,
    pub vpc: Option<VpcConfig>,
    pub dead_letter_target: Option<String>,
    pub tracing: Option<TracingMode>,
    pub environment: BTreeMap<String, String>,
    pub artifact: Bytes,
    pub publish: bool,
}

impl DeploymentDescriptor {
    /// Resolve environment variables and attach the artifact.
    pub fn from_config(config: &Config, artifact: Bytes) -> Result<Self> {
        let function = &config.function;

        Ok(Self {
            function_name: config.function_name()?,
            runtime: function.runtime.clone(),
            handler: function.handler.clone(),
            memory_size: function.memory_size,
            // validate() bounds the timeout to 900 seconds
            timeout_secs: function.timeout.as_secs() as u32,
            role: function.role.clone(),
            description: function.description.clone(),
            vpc: function.vpc.clone().filter(|vpc| !vpc.is_empty()),
            dead_letter_target: function
                .dead_letter_target
                .clone()
                .filter(|arn| !arn.is_empty()),
            tracing: function.tracing,
            environment: resolve_env_map(&function.env)?,
            artifact,
            publish: function.publish,
        })
    }

    /// Replace the artifact, keeping every other setting.
    pub fn with_artifact(mut self, artifact: Bytes) -> Self {
        self.artifact = artifact;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
function:
  name: api
  runtime: nodejs20.x
  role: arn:aws:iam::123456789012:role/api
  timeout: 30s
  vpc:
    subnets: []
    security_groups: []
  env:
    STAGE: prod
deploy:
  regions: [us-east-1]
"#;

    #[test]
    fn descriptor_carries_resolved_settings() {
        let config = Config::from_yaml(CONFIG).unwrap();
        let descriptor =
            DeploymentDescriptor::from_config(&config, Bytes::from_static(b"zip")).unwrap();

        assert_eq!(descriptor.function_name.as_str(), "api");
        assert_eq!(descriptor.handler, "index.handler");
        assert_eq!(descriptor.timeout_secs, 30);
        assert_eq!(descriptor.memory_size, 128);
        assert!(descriptor.vpc.is_none());
        assert_eq!(descriptor.environment.get("STAGE").map(String::as_str), Some("prod"));
        assert_eq!(&descriptor.artifact[..], b"zip");
    }

    #[test]
    fn environment_suffix_reaches_function_name() {
        let config = Config::from_yaml(CONFIG)
            .unwrap()
            .for_environment("staging")
            .unwrap();
        let descriptor = DeploymentDescriptor::from_config(&config, Bytes::new()).unwrap();
        assert_eq!(descriptor.function_name.as_str(), "api-staging");
    }
}
