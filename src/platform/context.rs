// ABOUTME: Explicit per-region connection context handed to platform connectors.
// ABOUTME: Carries the region, forwarded credentials and client tuning; never mutated once built.

use crate::types::Region;
use std::fmt;
use std::time::Duration;

/// Credentials forwarded to the platform client as supplied.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Resolve through the client's default provider chain.
    #[default]
    Default,
    /// Named profile from the shared credentials/config files.
    Profile(String),
    /// Explicit key pair with an optional session token.
    Static {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
}

// Secrets stay out of logs and error output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Default => f.write_str("Default"),
            Credentials::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            Credentials::Static {
                access_key_id,
                session_token,
                ..
            } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("session_token", &session_token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Everything a connector needs to reach one region.
#[derive(Debug, Clone)]
pub struct RegionContext {
    region: Region,
    credentials: Credentials,
    settings: ClientSettings,
}

impl RegionContext {
    pub fn new(region: Region, credentials: Credentials, settings: ClientSettings) -> Self {
        Self {
            region,
            credentials,
            settings,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }
}

/// Client tuning shared by every region of one deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Per-operation timeout, retries included.
    pub operation_timeout: Duration,
    /// Total attempts for retryable failures.
    pub max_attempts: u32,
    /// HTTP(S) proxy every platform request is routed through.
    pub proxy: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(120),
            max_attempts: 3,
            proxy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials::Static {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "super-secret".to_string(),
            session_token: Some("token-value".to_string()),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("token-value"));
    }
}
