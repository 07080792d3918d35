use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The closed set of archived entity kinds.
///
/// A kind cannot be inferred from an entity's stored bytes; it is supplied
/// at ingest time and recorded in the entity's metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Hierarchical grouping of deliverable units.
    Collection,
    /// The intellectual unit of archived material.
    DeliverableUnit,
    /// One concrete rendition of a deliverable unit as a set of files.
    Manifestation,
    /// A single digital file.
    File,
    /// A preservation event recorded against one or more entities.
    Event,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 5] = [
        Self::Collection,
        Self::DeliverableUnit,
        Self::Manifestation,
        Self::File,
        Self::Event,
    ];

    /// The order in which kinds appear in a serialized package.
    pub const SERIALIZATION_ORDER: [EntityKind; 5] = [
        Self::DeliverableUnit,
        Self::Collection,
        Self::Manifestation,
        Self::File,
        Self::Event,
    ];

    /// Canonical name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "Collection",
            Self::DeliverableUnit => "DeliverableUnit",
            Self::Manifestation => "Manifestation",
            Self::File => "File",
            Self::Event => "Event",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = TypeError;

    /// Parses the canonical name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownKind(s.to_string()))
    }
}
