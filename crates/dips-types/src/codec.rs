//! The parse/serialize boundary between the archive and the entity format.
//!
//! The archive treats stored entities as opaque bytes. Turning a parsed
//! [`Entity`] into canonical bytes, and reading references back out of those
//! bytes, is delegated to an [`EntityCodec`]. [`JsonCodec`] is the reference
//! implementation used by the filesystem archive and the CLI.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::TypeError;
use crate::kind::EntityKind;

/// Converts entities to and from their canonical stored form.
pub trait EntityCodec: Send + Sync {
    /// Serialize one entity to canonical bytes.
    fn encode(&self, entity: &Entity) -> Result<Vec<u8>, TypeError>;

    /// Parse stored bytes back into an entity of the expected kind.
    fn decode(&self, kind: EntityKind, bytes: &[u8]) -> Result<Entity, TypeError>;

    /// Parse and validate an incoming package of entities.
    ///
    /// Fails with [`TypeError::MalformedPackage`] before the caller touches
    /// any store.
    fn decode_package(&self, bytes: &[u8]) -> Result<Vec<Entity>, TypeError>;
}

/// Wire shape of an ingest package.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDocument {
    pub entities: Vec<Entity>,
}

/// JSON entity codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl EntityCodec for JsonCodec {
    fn encode(&self, entity: &Entity) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(entity).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    fn decode(&self, kind: EntityKind, bytes: &[u8]) -> Result<Entity, TypeError> {
        let entity: Entity =
            serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))?;
        if entity.kind() != kind {
            return Err(TypeError::KindMismatch {
                id: entity.id().to_string(),
                expected: kind.to_string(),
                actual: entity.kind().to_string(),
            });
        }
        Ok(entity)
    }

    fn decode_package(&self, bytes: &[u8]) -> Result<Vec<Entity>, TypeError> {
        let doc: PackageDocument = serde_json::from_slice(bytes)
            .map_err(|e| TypeError::MalformedPackage(e.to_string()))?;

        let mut seen = HashSet::new();
        for entity in &doc.entities {
            let id = entity.id();
            if id.as_str().trim().is_empty() {
                return Err(TypeError::MalformedPackage(format!(
                    "{} with empty id",
                    entity.kind()
                )));
            }
            if !seen.insert(id) {
                return Err(TypeError::MalformedPackage(format!("duplicate id {id}")));
            }
        }
        Ok(doc.entities)
    }
}
