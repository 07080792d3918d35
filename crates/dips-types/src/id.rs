use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Globally unique identifier of an archived entity.
///
/// Identifiers are opaque strings assigned by whoever produced the entity.
/// The archive never derives them from content; two entities with identical
/// bytes but different ids are distinct.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a string as an identifier without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an identifier, rejecting empty or whitespace-padded input.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::InvalidId("empty id".into()));
        }
        if s.trim() != s {
            return Err(TypeError::InvalidId(format!(
                "id has surrounding whitespace: {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_accepts_plain_ids() {
        let id = EntityId::parse("du-0001").unwrap();
        assert_eq!(id.as_str(), "du-0001");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(EntityId::parse(""), Err(TypeError::InvalidId(_))));
    }

    #[test]
    fn parse_rejects_padding() {
        assert!(EntityId::parse(" du-1").is_err());
        assert!(EntityId::parse("du-1\n").is_err());
    }

    #[test]
    fn display_is_raw_string() {
        assert_eq!(format!("{}", EntityId::new("C1")), "C1");
    }

    #[test]
    fn borrow_allows_str_lookup() {
        let mut set = HashSet::new();
        set.insert(EntityId::new("F1"));
        assert!(set.contains("F1"));
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&EntityId::new("M1")).unwrap();
        assert_eq!(json, "\"M1\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityId::new("M1"));
    }
}
