//! Opaque entity blob storage.
//!
//! The entity store holds the canonical serialized bytes of every archived
//! entity, keyed by entity id. It knows nothing about entity semantics:
//! kinds, links and content locations live in the metadata store.
//!
//! # Storage Backends
//!
//! All backends implement the [`EntityStore`] trait:
//!
//! - [`InMemoryEntityStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsEntityStore`] -- one file per blob, atomic replace on write
//!
//! # Design Rules
//!
//! 1. `put` is idempotent; different bytes under the same id replace the old.
//! 2. Reads of a missing id fail with [`StoreError::NotFound`].
//! 3. `remove` of a missing id is a no-op.
//! 4. Concurrent reads are always safe.
//! 5. The store never interprets blob contents.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{storage_key, FsEntityStore};
pub use memory::InMemoryEntityStore;
pub use traits::{BlobReader, EntityStore};
