//! The parsed entity model.
//!
//! These types are what the external model builder hands to the archive on
//! ingest, and what extraction policies decode from stored blobs. Only the
//! fields that carry references between entities are modelled explicitly;
//! everything else travels in the free-form `properties` map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::kind::EntityKind;

/// A hierarchical grouping of deliverable units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A typed relation from a deliverable unit to another entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub relation_type: String,
    pub target: EntityId,
}

/// The intellectual unit of archived material.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableUnit {
    pub id: EntityId,
    /// Parent collections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<EntityId>,
    /// Parent deliverable units.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<Relation>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// One concrete rendition of a deliverable unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifestation {
    pub id: EntityId,
    /// The owning deliverable unit. Always exactly one.
    pub deliverable_unit: EntityId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<EntityId>,
    /// Files packaged by this manifestation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A single digital file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntity {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<EntityId>,
    /// Where the file's bytes can be retrieved from, outside the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A preservation event recorded against other entities.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// Any archived entity, tagged by kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    Collection(Collection),
    DeliverableUnit(DeliverableUnit),
    Manifestation(Manifestation),
    File(FileEntity),
    Event(Event),
}

impl Entity {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Collection(c) => &c.id,
            Self::DeliverableUnit(d) => &d.id,
            Self::Manifestation(m) => &m.id,
            Self::File(f) => &f.id,
            Self::Event(e) => &e.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Collection(_) => EntityKind::Collection,
            Self::DeliverableUnit(_) => EntityKind::DeliverableUnit,
            Self::Manifestation(_) => EntityKind::Manifestation,
            Self::File(_) => EntityKind::File,
            Self::Event(_) => EntityKind::Event,
        }
    }

    /// The external content location. Only files carry one.
    pub fn content_location(&self) -> Option<&str> {
        match self {
            Self::File(f) => f.content_location.as_deref(),
            _ => None,
        }
    }

    /// Referenced metadata entities. Events reference none.
    pub fn metadata_refs(&self) -> &[EntityId] {
        match self {
            Self::Collection(c) => &c.metadata,
            Self::DeliverableUnit(d) => &d.metadata,
            Self::Manifestation(m) => &m.metadata,
            Self::File(f) => &f.metadata,
            Self::Event(_) => &[],
        }
    }
}

impl From<Collection> for Entity {
    fn from(c: Collection) -> Self {
        Self::Collection(c)
    }
}

impl From<DeliverableUnit> for Entity {
    fn from(d: DeliverableUnit) -> Self {
        Self::DeliverableUnit(d)
    }
}

impl From<Manifestation> for Entity {
    fn from(m: Manifestation) -> Self {
        Self::Manifestation(m)
    }
}

impl From<FileEntity> for Entity {
    fn from(f: FileEntity) -> Self {
        Self::File(f)
    }
}

impl From<Event> for Entity {
    fn from(e: Event) -> Self {
        Self::Event(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_id_follow_variant() {
        let e: Entity = Manifestation {
            id: "M1".into(),
            deliverable_unit: "D1".into(),
            ..Default::default()
        }
        .into();
        assert_eq!(e.kind(), EntityKind::Manifestation);
        assert_eq!(e.id().as_str(), "M1");
    }

    #[test]
    fn only_files_have_content_location() {
        let file: Entity = FileEntity {
            id: "F1".into(),
            content_location: Some("file:///tmp/f1".into()),
            ..Default::default()
        }
        .into();
        let event: Entity = Event {
            id: "E1".into(),
            ..Default::default()
        }
        .into();
        assert_eq!(file.content_location(), Some("file:///tmp/f1"));
        assert_eq!(event.content_location(), None);
        assert!(event.metadata_refs().is_empty());
    }

    #[test]
    fn json_carries_kind_tag() {
        let e: Entity = Collection {
            id: "C1".into(),
            ..Default::default()
        }
        .into();
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"kind":"Collection","id":"C1"}"#);
    }

    #[test]
    fn json_defaults_missing_reference_lists() {
        let e: Entity = serde_json::from_str(
            r#"{"kind":"DeliverableUnit","id":"D1","collections":["C1"]}"#,
        )
        .unwrap();
        match e {
            Entity::DeliverableUnit(d) => {
                assert_eq!(d.collections, vec![EntityId::new("C1")]);
                assert!(d.parents.is_empty());
                assert!(d.relations.is_empty());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
