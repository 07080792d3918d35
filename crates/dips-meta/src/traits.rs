//! The [`MetadataStore`] trait defining the metadata storage interface.

use dips_types::{EntityId, EntityKind};

use crate::error::Result;
use crate::record::{InboundLinks, MetadataRecord};

/// Storage backend for per-entity metadata records.
///
/// Implementations must be thread-safe (`Send + Sync`) and serialize their
/// own writes. A record exists for an id if and only if that entity has been
/// ingested, unless the store derives its records by some read-only means.
pub trait MetadataStore: Send + Sync {
    /// Read the record for `id`.
    ///
    /// Returns `Ok(None)` if the id is unknown.
    fn get(&self, id: &EntityId) -> Result<Option<MetadataRecord>>;

    /// Create the record for `id`.
    ///
    /// Idempotent: if a record already exists it is returned unchanged.
    fn add(
        &self,
        id: &EntityId,
        kind: EntityKind,
        content_location: Option<&str>,
    ) -> Result<MetadataRecord>;

    /// All records whose kind is in `kinds`, ordered by id.
    ///
    /// An empty `kinds` slice selects every record.
    fn get_all(&self, kinds: &[EntityKind]) -> Result<Vec<MetadataRecord>>;

    /// Delete the record for `id`. Returns `Ok(true)` if it existed.
    ///
    /// Inbound-link entries that other records hold for `id` are left alone.
    fn remove(&self, id: &EntityId) -> Result<bool>;

    /// Whether the store refuses mutations.
    fn is_read_only(&self) -> bool;

    /// Merge `links` into the inbound index of the record for `id` and
    /// persist it, returning the updated record.
    ///
    /// See [`MetadataRecord::add_links`] for the merge rule. Fails with
    /// `NotFound` if there is no record and `ReadOnly` on read-only stores.
    fn merge_links(&self, id: &EntityId, links: &InboundLinks) -> Result<MetadataRecord>;
}

/// Shared filter used by backends implementing [`MetadataStore::get_all`].
pub(crate) fn kind_selected(kinds: &[EntityKind], kind: EntityKind) -> bool {
    kinds.is_empty() || kinds.contains(&kind)
}
