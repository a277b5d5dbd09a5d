// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles runtime identifiers and non-empty region lists.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{Region, RuntimeId};

pub fn deserialize_runtime<'de, D>(deserializer: D) -> Result<RuntimeId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    RuntimeId::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_regions<'de, D>(deserializer: D) -> Result<NonEmpty<Region>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<RegionEntry> = Vec::deserialize(deserializer)?;
    regions_from_entries(values)
        .map_err(serde::de::Error::custom)?
        .ok_or_else(|| serde::de::Error::custom("at least one region is required"))
}

pub fn deserialize_regions_option<'de, D>(
    deserializer: D,
) -> Result<Option<NonEmpty<Region>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<RegionEntry>> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(values) => regions_from_entries(values)
            .map_err(serde::de::Error::custom)?
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("environment regions list cannot be empty")),
    }
}

/// Regions may be listed one per entry or as a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegionEntry {
    Single(Region),
    Joined(String),
}

fn regions_from_entries(entries: Vec<RegionEntry>) -> Result<Option<NonEmpty<Region>>, String> {
    let mut regions: Vec<Region> = Vec::new();
    for entry in entries {
        let parsed = match entry {
            RegionEntry::Single(region) => vec![region],
            RegionEntry::Joined(joined) => joined
                .split(',')
                .map(Region::new)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?,
        };
        for region in parsed {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
    }
    Ok(NonEmpty::from_vec(regions))
}
