// ABOUTME: Platform-compatible function name validation and composition.
// ABOUTME: Joins base name with environment/version suffixes and sanitizes the result.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FunctionNameError {
    #[error("function name cannot be empty")]
    Empty,

    #[error("function name exceeds maximum length of {MAX_LEN} characters: {0}")]
    TooLong(String),

    #[error("invalid character in function name: '{0}'")]
    InvalidChar(char),
}

/// Name a function is addressed by on the remote platform.
///
/// Only ASCII letters, digits, hyphens and underscores are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(value: &str) -> Result<Self, FunctionNameError> {
        if value.is_empty() {
            return Err(FunctionNameError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(FunctionNameError::TooLong(value.to_string()));
        }

        if let Some(c) = value.chars().find(|c| !is_allowed(*c)) {
            return Err(FunctionNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    /// Build the deployed name from a base name plus optional environment and
    /// version suffixes, e.g. `api` + `staging` + `1.2` becomes `api-staging-1-2`.
    ///
    /// Characters the platform rejects are replaced with `-`.
    pub fn compose(
        base: &str,
        environment: Option<&str>,
        version: Option<&str>,
    ) -> Result<Self, FunctionNameError> {
        let joined = [Some(base), environment, version]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        let sanitized: String = joined
            .chars()
            .map(|c| if is_allowed(c) { c } else { '-' })
            .collect();

        Self::new(&sanitized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_joins_suffixes() {
        let name = FunctionName::compose("api", Some("staging"), Some("1.2")).unwrap();
        assert_eq!(name.as_str(), "api-staging-1-2");
    }

    #[test]
    fn compose_without_suffixes() {
        let name = FunctionName::compose("api", None, None).unwrap();
        assert_eq!(name.as_str(), "api");
    }

    #[test]
    fn compose_skips_empty_suffix() {
        let name = FunctionName::compose("api", Some(""), None).unwrap();
        assert_eq!(name.as_str(), "api");
    }

    #[test]
    fn new_rejects_dots() {
        assert_eq!(
            FunctionName::new("my.fn").unwrap_err(),
            FunctionNameError::InvalidChar('.')
        );
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(65);
        assert!(matches!(
            FunctionName::new(&long),
            Err(FunctionNameError::TooLong(_))
        ));
    }

    #[test]
    fn rejects_empty_base() {
        assert_eq!(
            FunctionName::compose("", None, None).unwrap_err(),
            FunctionNameError::Empty
        );
    }
}
