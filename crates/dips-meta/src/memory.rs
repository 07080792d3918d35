//! In-memory metadata store for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use dips_types::{EntityId, EntityKind};
use tracing::{debug, warn};

use crate::error::{MetaError, Result};
use crate::record::{InboundLinks, MetadataRecord};
use crate::traits::{kind_selected, MetadataStore};

/// An in-memory implementation of [`MetadataStore`].
///
/// All records live in a `HashMap` behind a `RwLock` and are lost when the
/// store is dropped. A store built with [`InMemoryMetadataStore::read_only`]
/// serves a fixed set of derived records and rejects mutations.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<EntityId, MetadataRecord>>,
    read_only: bool,
}

impl InMemoryMetadataStore {
    /// Create a new empty, writable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a read-only store serving `records`.
    pub fn read_only(records: impl IntoIterator<Item = MetadataRecord>) -> Self {
        let records = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: RwLock::new(records),
            read_only: true,
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if no records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn get(&self, id: &EntityId) -> Result<Option<MetadataRecord>> {
        let records = self.records.read().map_err(|_| MetaError::Poisoned)?;
        Ok(records.get(id).cloned())
    }

    fn add(
        &self,
        id: &EntityId,
        kind: EntityKind,
        content_location: Option<&str>,
    ) -> Result<MetadataRecord> {
        let mut records = self.records.write().map_err(|_| MetaError::Poisoned)?;
        if let Some(existing) = records.get(id) {
            if existing.kind != kind {
                warn!(%id, recorded = %existing.kind, requested = %kind, "kind differs from existing record; keeping existing");
            }
            return Ok(existing.clone());
        }
        if self.read_only {
            return Err(MetaError::ReadOnly);
        }
        let record = MetadataRecord::new(id.clone(), kind, content_location.map(str::to_string));
        records.insert(id.clone(), record.clone());
        debug!(%id, %kind, "added metadata record");
        Ok(record)
    }

    fn get_all(&self, kinds: &[EntityKind]) -> Result<Vec<MetadataRecord>> {
        let records = self.records.read().map_err(|_| MetaError::Poisoned)?;
        let mut result: Vec<MetadataRecord> = records
            .values()
            .filter(|r| kind_selected(kinds, r.kind))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    fn remove(&self, id: &EntityId) -> Result<bool> {
        if self.read_only {
            return Err(MetaError::ReadOnly);
        }
        let mut records = self.records.write().map_err(|_| MetaError::Poisoned)?;
        Ok(records.remove(id).is_some())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn merge_links(&self, id: &EntityId, links: &InboundLinks) -> Result<MetadataRecord> {
        if self.read_only {
            return Err(MetaError::ReadOnly);
        }
        let mut records = self.records.write().map_err(|_| MetaError::Poisoned)?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| MetaError::NotFound(id.clone()))?;
        let added = record.add_links(links);
        debug!(%id, added, total = record.inbound_links().len(), "merged inbound links");
        Ok(record.clone())
    }
}
