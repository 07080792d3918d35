//! Outbound link discovery.
//!
//! Links are naturally expressed by the source ("X points to Y"), but the
//! metadata index is keyed by target ("Y is pointed at by X"). The
//! [`LinkFinder`] computes the outbound targets of freshly ingested entities
//! and shapes them so they can be merged straight into target records.

use std::collections::BTreeMap;

use dips_types::{Entity, EntityId};

use crate::record::InboundLinks;

/// Target id -> (source id -> source kind).
///
/// Several sources in one package may point at the same target, hence the
/// second level.
pub type OutboundLinks = BTreeMap<EntityId, InboundLinks>;

/// Computes outbound links per entity kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkFinder;

impl LinkFinder {
    /// Ids the entity refers to, excluding itself, in declaration order.
    ///
    /// | Kind | Targets |
    /// |---|---|
    /// | Collection | parent collection, metadata |
    /// | DeliverableUnit | parent collections, parent units, metadata, relation targets |
    /// | Manifestation | owning unit, metadata, packaged files |
    /// | File | metadata |
    /// | Event | described targets |
    pub fn outbound_targets(entity: &Entity) -> Vec<&EntityId> {
        let targets: Vec<&EntityId> = match entity {
            Entity::Collection(c) => c.parent.iter().chain(&c.metadata).collect(),
            Entity::DeliverableUnit(d) => d
                .collections
                .iter()
                .chain(&d.parents)
                .chain(&d.metadata)
                .chain(d.relations.iter().map(|r| &r.target))
                .collect(),
            Entity::Manifestation(m) => std::iter::once(&m.deliverable_unit)
                .chain(&m.metadata)
                .chain(&m.files)
                .collect(),
            Entity::File(f) => f.metadata.iter().collect(),
            Entity::Event(e) => e.targets.iter().collect(),
        };
        let own = entity.id();
        targets.into_iter().filter(|t| *t != own).collect()
    }

    /// Outbound links of one entity, keyed by target.
    pub fn outbound_links(entity: &Entity) -> OutboundLinks {
        let source = entity.id();
        let kind = entity.kind();
        let mut links = OutboundLinks::new();
        for target in Self::outbound_targets(entity) {
            links
                .entry(target.clone())
                .or_default()
                .insert(source.clone(), kind);
        }
        links
    }

    /// Merge `links` into `acc`, combining per-target source maps.
    pub fn merge(acc: &mut OutboundLinks, links: OutboundLinks) {
        for (target, sources) in links {
            acc.entry(target).or_default().extend(sources);
        }
    }

    /// Merged outbound links of every entity in a package.
    pub fn for_package<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> OutboundLinks {
        let mut acc = OutboundLinks::new();
        for entity in entities {
            Self::merge(&mut acc, Self::outbound_links(entity));
        }
        acc
    }
}
