use std::io::{Cursor, Read};

use dips_types::EntityId;

use crate::error::StoreResult;

/// A boxed reader over one stored blob. Dropping it releases the blob.
pub type BlobReader = Box<dyn Read + Send>;

/// Opaque blob storage keyed by entity id.
///
/// All implementations must satisfy these invariants:
/// - `put` is idempotent. Storing identical bytes again is a no-op in effect;
///   storing different bytes under the same id replaces them.
/// - `get` and `open` fail with `NotFound` when nothing is stored for the id.
/// - `remove` never fails because the id is missing.
/// - The store never interprets blob contents.
pub trait EntityStore: Send + Sync {
    /// Store `bytes` under `id`, replacing any previous blob.
    fn put(&self, id: &EntityId, bytes: &[u8]) -> StoreResult<()>;

    /// Read the full blob stored under `id`.
    fn get(&self, id: &EntityId) -> StoreResult<Vec<u8>>;

    /// Remove the blob stored under `id`, if any.
    fn remove(&self, id: &EntityId) -> StoreResult<()>;

    /// Check whether a blob exists for `id`.
    fn contains(&self, id: &EntityId) -> StoreResult<bool>;

    /// Open the blob stored under `id` for streaming reads.
    ///
    /// The default implementation buffers the whole blob. Backends that can
    /// stream from their medium should override it.
    fn open(&self, id: &EntityId) -> StoreResult<BlobReader> {
        let bytes = self.get(id)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}
