// ABOUTME: Deployment region name validation.
// ABOUTME: Regions are lowercase dash-separated identifiers such as us-east-1.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("region cannot be empty")]
    Empty,

    #[error("invalid region name: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(value: &str) -> Result<Self, RegionError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(RegionError::Empty);
        }

        let well_formed = value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && value.contains('-')
            && !value.starts_with('-')
            && !value.ends_with('-');

        if !well_formed {
            return Err(RegionError::Invalid(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Region::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_regions() {
        assert_eq!(Region::new("us-east-1").unwrap().as_str(), "us-east-1");
        assert_eq!(Region::new(" eu-west-2 ").unwrap().as_str(), "eu-west-2");
    }

    #[test]
    fn rejects_malformed_regions() {
        assert_eq!(Region::new("").unwrap_err(), RegionError::Empty);
        assert!(matches!(Region::new("US-EAST-1"), Err(RegionError::Invalid(_))));
        assert!(matches!(Region::new("useast1"), Err(RegionError::Invalid(_))));
        assert!(matches!(Region::new("-us-east"), Err(RegionError::Invalid(_))));
    }
}
