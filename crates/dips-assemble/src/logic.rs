//! Extraction policies ("DIP logic").
//!
//! A policy looks at one entity at a time and answers two questions: does
//! this entity belong in the package, and which other entities might? The
//! answer is a single id set. Containing the examined id means *accept*;
//! lacking it means *reject*; every other id is a candidate for the
//! assembler to explore next.
//!
//! Policies never recurse and never see traversal state. They may be handed
//! the same entity by concurrent assemblies and must be `Send + Sync`.

use std::collections::BTreeSet;
use std::io::Read;
use std::sync::Arc;

use dips_meta::MetadataRecord;
use dips_types::{Entity, EntityCodec, EntityId, EntityKind, JsonCodec};

use crate::error::{AssembleError, AssembleResult};

/// Pluggable per-entity extraction rule set.
pub trait DipLogic: Send + Sync {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Decide relevance for one entity.
    ///
    /// `content` streams the entity's stored bytes; the caller owns it and
    /// releases it when this call returns, whether or not it succeeds.
    /// `metadata` carries the entity's kind and accumulated inbound links.
    fn extract(
        &self,
        id: &EntityId,
        content: &mut dyn Read,
        metadata: &MetadataRecord,
        is_root: bool,
    ) -> AssembleResult<BTreeSet<EntityId>>;
}

// ---------------------------------------------------------------------------
// SingleEntityLogic
// ---------------------------------------------------------------------------

/// Accepts the root and nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleEntityLogic;

impl DipLogic for SingleEntityLogic {
    fn name(&self) -> &'static str {
        "single"
    }

    fn extract(
        &self,
        id: &EntityId,
        _content: &mut dyn Read,
        _metadata: &MetadataRecord,
        is_root: bool,
    ) -> AssembleResult<BTreeSet<EntityId>> {
        let mut result = BTreeSet::new();
        if is_root {
            result.insert(id.clone());
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// ExtendedDipLogic
// ---------------------------------------------------------------------------

/// Full-tree policy.
///
/// Every visited entity is accepted. Outbound references that make an
/// entity intelligible (parents, collections, metadata, owning unit,
/// packaged files) are always followed. Inbound references (events about
/// an entity, manifestations containing it) are followed only from the
/// root, which keeps the walk from sweeping in siblings.
///
/// | Kind | Always | Root only |
/// |---|---|---|
/// | Collection | parent, metadata | |
/// | DeliverableUnit | collections, parent units, metadata | inbound manifestations, inbound events |
/// | Manifestation | owning unit, metadata, files | inbound events |
/// | File | metadata | inbound manifestations, inbound events |
/// | Event | | described targets |
#[derive(Clone)]
pub struct ExtendedDipLogic {
    codec: Arc<dyn EntityCodec>,
}

impl ExtendedDipLogic {
    /// Create the policy decoding content with `codec`.
    pub fn new(codec: Arc<dyn EntityCodec>) -> Self {
        Self { codec }
    }

    fn decode(&self, id: &EntityId, kind: EntityKind, content: &mut dyn Read) -> AssembleResult<Entity> {
        let mut bytes = Vec::new();
        content
            .read_to_end(&mut bytes)
            .map_err(|source| AssembleError::Io { id: id.clone(), source })?;
        self.codec
            .decode(kind, &bytes)
            .map_err(|source| AssembleError::Decode { id: id.clone(), source })
    }
}

impl Default for ExtendedDipLogic {
    fn default() -> Self {
        Self::new(Arc::new(JsonCodec))
    }
}

impl std::fmt::Debug for ExtendedDipLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedDipLogic").finish_non_exhaustive()
    }
}

impl DipLogic for ExtendedDipLogic {
    fn name(&self) -> &'static str {
        "extended"
    }

    fn extract(
        &self,
        id: &EntityId,
        content: &mut dyn Read,
        metadata: &MetadataRecord,
        is_root: bool,
    ) -> AssembleResult<BTreeSet<EntityId>> {
        let entity = self.decode(id, metadata.kind, content)?;

        let mut result = BTreeSet::new();
        result.insert(id.clone());

        let inbound = |kinds: &[EntityKind]| -> Vec<EntityId> {
            kinds
                .iter()
                .flat_map(|k| metadata.inbound_of_kind(*k).cloned())
                .collect()
        };

        match &entity {
            Entity::Collection(c) => {
                result.extend(c.parent.iter().cloned());
                result.extend(c.metadata.iter().cloned());
            }
            Entity::DeliverableUnit(d) => {
                result.extend(d.collections.iter().cloned());
                result.extend(d.parents.iter().cloned());
                result.extend(d.metadata.iter().cloned());
                if is_root {
                    result.extend(inbound(&[EntityKind::Manifestation, EntityKind::Event]));
                }
            }
            Entity::Manifestation(m) => {
                result.insert(m.deliverable_unit.clone());
                result.extend(m.metadata.iter().cloned());
                result.extend(m.files.iter().cloned());
                if is_root {
                    result.extend(inbound(&[EntityKind::Event]));
                }
            }
            Entity::File(f) => {
                result.extend(f.metadata.iter().cloned());
                if is_root {
                    result.extend(inbound(&[EntityKind::Manifestation, EntityKind::Event]));
                }
            }
            Entity::Event(e) => {
                if is_root {
                    result.extend(e.targets.iter().cloned());
                }
            }
        }
        Ok(result)
    }
}
