// ABOUTME: Function runtime identifier restricted to a supported allow-list.
// ABOUTME: Invalid identifiers are rejected while loading configuration.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Runtimes the artifact builder knows how to package for.
pub const SUPPORTED_RUNTIMES: &[&str] = &["nodejs18.x", "nodejs20.x", "nodejs22.x"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported runtime '{0}' (expected one of: {list})", list = SUPPORTED_RUNTIMES.join(", "))]
pub struct RuntimeIdError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RuntimeId(String);

impl RuntimeId {
    pub fn new(value: &str) -> Result<Self, RuntimeIdError> {
        if SUPPORTED_RUNTIMES.contains(&value) {
            Ok(Self(value.to_string()))
        } else {
            Err(RuntimeIdError(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
