// ABOUTME: Phantom-typed handles for remote platform resources.
// ABOUTME: Keeps function ARNs, event-source mapping ids and rule ARNs apart at compile time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum FunctionMarker {}
pub enum MappingMarker {}
pub enum RuleMarker {}

/// A type-safe identifier that prevents accidental mixing of different ID types.
///
/// A `MappingId` (the platform's opaque event-source handle) can never be passed
/// where a `FunctionArn` is expected, even though both are strings on the wire.
#[must_use = "IDs reference remote resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// T is only a marker, so none of these impls may require bounds on it.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// Fully-qualified function identifier returned by create/get.
pub type FunctionArn = Id<FunctionMarker>;
/// Opaque handle of an event-source mapping (the platform's UUID).
pub type MappingId = Id<MappingMarker>;
/// ARN of a schedule rule.
pub type RuleArn = Id<RuleMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(MappingId::new("u1"), MappingId::new("u1".to_string()));
        assert_ne!(MappingId::new("u1"), MappingId::new("u2"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let arn = FunctionArn::new("arn:aws:lambda:us-east-1:123:function:f");
        let json = serde_json::to_string(&arn).unwrap();
        assert_eq!(json, "\"arn:aws:lambda:us-east-1:123:function:f\"");
        let back: FunctionArn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, arn);
    }
}
