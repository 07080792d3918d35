use std::collections::HashMap;
use std::sync::RwLock;

use dips_types::EntityId;

use crate::error::{StoreError, StoreResult};
use crate::traits::EntityStore;

/// In-memory, HashMap-based entity store.
///
/// Intended for tests and embedding. Blobs live behind a `RwLock` and are
/// cloned on read.
pub struct InMemoryEntityStore {
    blobs: RwLock<HashMap<EntityId, Vec<u8>>>,
}

impl InMemoryEntityStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn put(&self, id: &EntityId, bytes: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        match map.get(id) {
            Some(existing) if existing.as_slice() == bytes => {}
            _ => {
                map.insert(id.clone(), bytes.to_vec());
            }
        }
        Ok(())
    }

    fn get(&self, id: &EntityId) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        map.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn remove(&self, id: &EntityId) -> StoreResult<()> {
        let mut map = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        map.remove(id);
        Ok(())
    }

    fn contains(&self, id: &EntityId) -> StoreResult<bool> {
        let map = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryEntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEntityStore")
            .field("entity_count", &self.len())
            .finish()
    }
}
