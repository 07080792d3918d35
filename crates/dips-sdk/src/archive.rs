use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::sync::Arc;

use dips_assemble::{AssemblyOutcome, DipLogic, ExtendedDipLogic, PackageAssembler};
use dips_meta::{
    FsMetadataStore, InMemoryMetadataStore, LinkFinder, MetaError, MetadataRecord, MetadataStore,
};
use dips_pack::PackageStream;
use dips_store::{EntityStore, FsEntityStore, InMemoryEntityStore};
use dips_types::{Entity, EntityCodec, EntityId, EntityKind, JsonCodec};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ArchiveConfig, PolicyKind};
use crate::content::resolve_location;
use crate::error::{ArchiveError, ArchiveResult};

/// What one ingest call did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Entities written to the stores.
    pub entities: usize,
    /// Target records that had inbound links merged into them.
    pub linked_targets: usize,
    /// Link targets with no metadata record in this archive.
    pub dangling_targets: Vec<EntityId>,
    /// Link merging was skipped because the metadata store is read-only.
    pub links_skipped: bool,
    /// Entities left out because the read-only metadata store holds no
    /// record for them.
    pub skipped: Vec<EntityId>,
}

/// The archive: entity blobs, their metadata, and package assembly.
///
/// Stores are shared by `Arc`; every request builds its own traversal and
/// stream state, so one `Archive` can serve concurrent callers.
pub struct Archive {
    entities: Arc<dyn EntityStore>,
    metadata: Arc<dyn MetadataStore>,
    codec: Arc<dyn EntityCodec>,
    config: ArchiveConfig,
}

impl Archive {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        metadata: Arc<dyn MetadataStore>,
        codec: Arc<dyn EntityCodec>,
    ) -> Self {
        Self {
            entities,
            metadata,
            codec,
            config: ArchiveConfig::default(),
        }
    }

    /// An archive held entirely in memory, using the JSON codec.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(JsonCodec),
        )
    }

    /// Open (or create) a filesystem archive under `config.root`.
    pub fn open(config: &ArchiveConfig) -> ArchiveResult<Self> {
        let metadata = if config.read_only {
            FsMetadataStore::open_read_only(config.metadata_dir())?
        } else {
            FsMetadataStore::open(config.metadata_dir())?
        };
        let entities = FsEntityStore::open(config.entities_dir())?;
        debug!(root = %config.root.display(), read_only = config.read_only, "archive opened");
        Ok(Self {
            entities: Arc::new(entities),
            metadata: Arc::new(metadata),
            codec: Arc::new(JsonCodec),
            config: config.clone(),
        })
    }

    pub fn with_config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Build a named policy bound to this archive's codec.
    pub fn policy(&self, kind: PolicyKind) -> Box<dyn DipLogic> {
        kind.logic(Arc::clone(&self.codec))
    }

    // ---- Ingest ----

    /// Store a parsed package and index its links.
    ///
    /// Ingest is not transactional: a failure part way through leaves the
    /// entities already written in place.
    pub fn put_package(&self, package: &[Entity]) -> ArchiveResult<IngestReport> {
        let mut report = IngestReport::default();

        let read_only = self.metadata.is_read_only();
        for entity in package {
            let id = entity.id();
            if read_only && self.metadata.get(id)?.is_none() {
                debug!(%id, "no record in read-only metadata store; entity not stored");
                report.skipped.push(id.clone());
                continue;
            }
            let bytes = self.codec.encode(entity)?;
            self.entities.put(id, &bytes)?;
            match self.metadata.add(id, entity.kind(), entity.content_location()) {
                Ok(_) => report.entities += 1,
                Err(MetaError::ReadOnly) => {
                    debug!(%id, "metadata store refused the record; entity not stored");
                    self.entities.remove(id)?;
                    report.skipped.push(id.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        if read_only {
            debug!("metadata store is read-only; links not merged");
            report.links_skipped = true;
        } else {
            for (target, sources) in LinkFinder::for_package(package) {
                if self.metadata.get(&target)?.is_none() {
                    warn!(%target, "link target not held by this archive; skipping");
                    report.dangling_targets.push(target);
                    continue;
                }
                match self.metadata.merge_links(&target, &sources) {
                    Ok(_) => report.linked_targets += 1,
                    Err(MetaError::ReadOnly) => {
                        debug!(%target, "read-only record; links not merged");
                    }
                    Err(MetaError::NotFound(_)) => {
                        warn!(%target, "link target vanished during ingest; skipping");
                        report.dangling_targets.push(target);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        info!(
            entities = report.entities,
            linked = report.linked_targets,
            dangling = report.dangling_targets.len(),
            skipped = report.skipped.len(),
            "package ingested"
        );
        Ok(report)
    }

    /// Parse a serialized package and ingest it.
    ///
    /// A package that does not parse is rejected before anything is stored.
    pub fn put_package_bytes(&self, bytes: &[u8]) -> ArchiveResult<IngestReport> {
        let package = self.codec.decode_package(bytes)?;
        self.put_package(&package)
    }

    // ---- Retrieval ----

    /// Derive the package rooted at `seed` under `logic`.
    pub fn assemble(&self, seed: &EntityId, logic: &dyn DipLogic) -> ArchiveResult<AssemblyOutcome> {
        let outcome =
            PackageAssembler::new(self.entities.as_ref(), self.metadata.as_ref(), logic).assemble(seed)?;
        Ok(outcome)
    }

    /// Assemble and serialize the package rooted at `seed`.
    pub fn get_package(&self, seed: &EntityId, logic: &dyn DipLogic) -> ArchiveResult<PackageStream> {
        let outcome = self.assemble(seed, logic)?;
        Ok(PackageStream::new(Arc::clone(&self.entities), &outcome.package))
    }

    /// [`get_package`](Self::get_package) with the extended policy.
    pub fn get_full_package(&self, seed: &EntityId) -> ArchiveResult<PackageStream> {
        let logic = ExtendedDipLogic::new(Arc::clone(&self.codec));
        self.get_package(seed, &logic)
    }

    /// Write the package rooted at `seed` to `out`, zstd-compressed when
    /// `level` is set. Returns the uncompressed size.
    pub fn export_package<W: Write>(
        &self,
        seed: &EntityId,
        logic: &dyn DipLogic,
        out: W,
        level: Option<i32>,
    ) -> ArchiveResult<u64> {
        let stream = self.get_package(seed, logic)?;
        let written = match level {
            Some(level) => dips_pack::export_compressed(stream, out, level)?,
            None => dips_pack::export(stream, out)?,
        };
        Ok(written)
    }

    /// Open the external content of a file entity.
    pub fn get_content(&self, id: &EntityId) -> ArchiveResult<Box<dyn Read + Send>> {
        let record = self.record(id)?;
        let location = record
            .content_location
            .ok_or_else(|| ArchiveError::NoContentLocation(id.clone()))?;
        let path = resolve_location(&location)?;
        debug!(%id, path = %path.display(), "opening content");
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    // ---- Catalogue ----

    /// Ids of every entity of the given kinds; all kinds when empty.
    pub fn list_entities(&self, kinds: &[EntityKind]) -> ArchiveResult<Vec<EntityId>> {
        Ok(self
            .metadata
            .get_all(kinds)?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    /// The metadata record for `id`.
    pub fn record(&self, id: &EntityId) -> ArchiveResult<MetadataRecord> {
        self.metadata
            .get(id)?
            .ok_or_else(|| ArchiveError::NotFound(id.clone()))
    }

    /// Remove an entity's blob and metadata record.
    ///
    /// Other records' inbound links to `id` are left as they are. Returns
    /// `false` if no record existed.
    pub fn remove_entity(&self, id: &EntityId) -> ArchiveResult<bool> {
        let existed = self.metadata.remove(id)?;
        self.entities.remove(id)?;
        if existed {
            info!(%id, "entity removed");
        }
        Ok(existed)
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("config", &self.config)
            .field("read_only", &self.metadata.is_read_only())
            .finish_non_exhaustive()
    }
}
