// ABOUTME: Deployment target settings and forwarded credentials.
// ABOUTME: Region list, desired-state file, client timeout and retry attempts.

use super::deserialize::deserialize_regions;
use super::env_value::{EnvValue, resolve_optional};
use crate::error::{Error, Result};
use crate::platform::{ClientSettings, Credentials};
use crate::types::Region;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    #[serde(deserialize_with = "deserialize_regions")]
    pub regions: NonEmpty<Region>,

    /// Event-source/schedule document. Absent means bindings are left alone.
    #[serde(default)]
    pub event_sources: Option<PathBuf>,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Proxy URL for platform requests, e.g. `http://proxy.internal:3128`.
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_attempts() -> u32 {
    3
}

impl DeployConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            operation_timeout: self.timeout,
            max_attempts: self.max_attempts,
            proxy: self.proxy.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<EnvValue>,
    #[serde(default)]
    pub secret_access_key: Option<EnvValue>,
    #[serde(default)]
    pub session_token: Option<EnvValue>,
}

impl CredentialsConfig {
    /// A key pair wins over a profile; neither means the default provider chain.
    pub fn resolve(&self) -> Result<Credentials> {
        let access_key_id = resolve_optional(self.access_key_id.as_ref())?;
        let secret_access_key = resolve_optional(self.secret_access_key.as_ref())?;

        match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Credentials::Static {
                access_key_id,
                secret_access_key,
                session_token: resolve_optional(self.session_token.as_ref())?,
            }),
            (Some(_), None) | (None, Some(_)) => Err(Error::InvalidConfig(
                "access_key_id and secret_access_key must be set together".to_string(),
            )),
            (None, None) => Ok(self
                .profile
                .clone()
                .map(Credentials::Profile)
                .unwrap_or_default()),
        }
    }
}
