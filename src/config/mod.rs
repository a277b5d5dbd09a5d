// ABOUTME: Configuration types and parsing for lambdeploy.yml.
// ABOUTME: Handles YAML parsing, validation, env var interpolation and environment overrides.

mod build;
mod deploy;
mod deserialize;
mod env_value;
mod function;

pub use build::BuildConfig;
pub use deploy::{CredentialsConfig, DeployConfig};
pub use env_value::{EnvValue, resolve_env_map, resolve_optional};
pub use function::{FunctionConfig, MEMORY_RANGE_MB, TIMEOUT_RANGE_SECS, TracingMode, VpcConfig};

use crate::build::BuildRequest;
use crate::error::{Error, Result};
use crate::platform::{ClientSettings, Credentials};
use crate::types::{FunctionName, Region};
use deserialize::deserialize_regions_option;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "lambdeploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "lambdeploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".lambdeploy/config.yml";

/// Environment name handed to the post-install hook when none is selected.
/// The deployed function name carries no suffix in that case.
pub const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub function: FunctionConfig,

    #[serde(default)]
    pub build: BuildConfig,

    pub deploy: DeployConfig,

    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,

    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

/// Settings layered on top of the base config for one environment.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnvironmentOverride {
    #[serde(default, deserialize_with = "deserialize_regions_option")]
    pub regions: Option<NonEmpty<Region>>,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub memory_size: Option<u32>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub event_sources: Option<PathBuf>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Using configuration {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Check everything that can be checked before touching the network or
    /// spawning processes. The runtime allow-list is enforced during parsing.
    pub fn validate(&self) -> Result<()> {
        let function = &self.function;

        if function.handler.trim().is_empty() {
            return Err(Error::InvalidConfig("function handler cannot be empty".into()));
        }

        if function.role.trim().is_empty() {
            return Err(Error::InvalidConfig("function role cannot be empty".into()));
        }

        if !MEMORY_RANGE_MB.contains(&function.memory_size) {
            return Err(Error::InvalidConfig(format!(
                "memory_size must be between {} and {} MB, got {}",
                MEMORY_RANGE_MB.start(),
                MEMORY_RANGE_MB.end(),
                function.memory_size
            )));
        }

        let timeout = function.timeout.as_secs();
        if !TIMEOUT_RANGE_SECS.contains(&timeout) || function.timeout.subsec_nanos() != 0 {
            return Err(Error::InvalidConfig(format!(
                "timeout must be a whole number of seconds between {} and {}, got {:?}",
                TIMEOUT_RANGE_SECS.start(),
                TIMEOUT_RANGE_SECS.end(),
                function.timeout
            )));
        }

        if self.deploy.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".into()));
        }

        if let Some(proxy) = &self.deploy.proxy
            && !(proxy.starts_with("http://") || proxy.starts_with("https://"))
        {
            return Err(Error::InvalidConfig(format!(
                "proxy must be an http:// or https:// URL, got {proxy}"
            )));
        }

        if self.build.install_command.is_empty() && !self.build.skip_install {
            return Err(Error::InvalidConfig("install_command cannot be empty".into()));
        }

        self.function_name()?;
        Ok(())
    }

    /// Apply the named environment: sets the name suffix and merges any
    /// matching entry from `environments`.
    pub fn for_environment(&self, name: &str) -> Result<Config> {
        let mut merged = self.clone();
        merged.function.environment = Some(name.to_string());

        let Some(overrides) = self.environments.get(name) else {
            tracing::debug!("No overrides for environment {}", name);
            merged.validate()?;
            return Ok(merged);
        };

        if let Some(ref regions) = overrides.regions {
            merged.deploy.regions = regions.clone();
        }

        for (k, v) in &overrides.env {
            merged.function.env.insert(k.clone(), v.clone());
        }

        if let Some(memory_size) = overrides.memory_size {
            merged.function.memory_size = memory_size;
        }

        if let Some(timeout) = overrides.timeout {
            merged.function.timeout = timeout;
        }

        if let Some(ref role) = overrides.role {
            merged.function.role = role.clone();
        }

        if let Some(ref event_sources) = overrides.event_sources {
            merged.deploy.event_sources = Some(event_sources.clone());
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Deployed function name including environment and version suffixes.
    pub fn function_name(&self) -> Result<FunctionName> {
        FunctionName::compose(
            &self.function.name,
            self.function.environment.as_deref(),
            self.function.version.as_deref(),
        )
        .map_err(Error::from)
    }

    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials
            .as_ref()
            .map(CredentialsConfig::resolve)
            .unwrap_or(Ok(Credentials::Default))
    }

    pub fn client_settings(&self) -> ClientSettings {
        self.deploy.client_settings()
    }

    /// Build inputs with relative paths resolved against `base`.
    pub fn build_request(&self, base: &Path) -> BuildRequest {
        let build = &self.build;
        let source_dir = base.join(&build.source_dir);

        let mut exclude = build.exclude.clone();
        if let Some(pattern) = output_dir_exclude(&source_dir, &base.join(&build.output_dir)) {
            exclude.push(pattern);
        }

        BuildRequest {
            source_dir,
            exclude,
            install: build.install_policy(),
            function: self.function.name.clone(),
            environment: self
                .function
                .environment
                .clone()
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            prebuilt_dir: build.prebuilt_dir.as_ref().map(|p| base.join(p)),
            archive: build.archive.as_ref().map(|p| base.join(p)),
        }
    }

    /// Event sources document, resolved against `base`.
    pub fn event_sources_path(&self, base: &Path) -> Option<PathBuf> {
        self.deploy.event_sources.as_ref().map(|p| base.join(p))
    }
}

/// Anchored directory exclude for `output_dir` when it lies inside the source
/// tree, so earlier `package` output never ships in the next artifact.
fn output_dir_exclude(source_dir: &Path, output_dir: &Path) -> Option<String> {
    let relative = output_dir.strip_prefix(source_dir).ok()?;
    let components: Vec<_> = relative
        .components()
        .map(|c| glob::Pattern::escape(&c.as_os_str().to_string_lossy()))
        .collect();
    if components.is_empty() {
        return None;
    }
    Some(format!("/{}/", components.join("/")))
}
