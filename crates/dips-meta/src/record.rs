//! The per-entity metadata record.

use std::collections::BTreeMap;

use dips_types::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// Inverted link index: source entity id -> source entity kind.
///
/// An entry `X -> K` on the record of `Y` means "entity `X`, of kind `K`,
/// has an outbound link to `Y`".
pub type InboundLinks = BTreeMap<EntityId, EntityKind>;

/// Metadata kept for every ingested entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// The entity id. Never changes.
    pub id: EntityId,
    /// The kind supplied at ingest.
    pub kind: EntityKind,
    /// External location of the entity's bytes (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,
    #[serde(default)]
    inbound_links: InboundLinks,
}

impl MetadataRecord {
    /// Create a record with no inbound links.
    pub fn new(id: EntityId, kind: EntityKind, content_location: Option<String>) -> Self {
        Self {
            id,
            kind,
            content_location,
            inbound_links: InboundLinks::new(),
        }
    }

    /// Entities known to link to this one.
    pub fn inbound_links(&self) -> &InboundLinks {
        &self.inbound_links
    }

    /// Inbound link sources of the given kind, in id order.
    pub fn inbound_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityId> + '_ {
        self.inbound_links
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(id, _)| id)
    }

    /// Merge `links` into the inbound index.
    ///
    /// Existing sources are overwritten with the new kind, new sources are
    /// added, and nothing is ever removed. Returns the number of sources that
    /// were not present before.
    pub fn add_links(&mut self, links: &InboundLinks) -> usize {
        let mut added = 0;
        for (source, kind) in links {
            if self.inbound_links.insert(source.clone(), *kind).is_none() {
                added += 1;
            }
        }
        added
    }
}
