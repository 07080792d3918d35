//! High-level API for the package-assembly archive.
//!
//! [`Archive`] ties the entity store, the metadata store, the extraction
//! policies and the package serializer together. It is the entry point for
//! applications embedding the archive and for the `dips` command line tool.

pub mod archive;
pub mod config;
pub mod content;
pub mod error;

pub use archive::{Archive, IngestReport};
pub use config::{ArchiveConfig, PolicyKind};
pub use content::{normalize_location, resolve_location};
pub use error::{ArchiveError, ArchiveResult};

// Re-export key types
pub use dips_assemble::{AssembledPackage, AssemblyOutcome, DipLogic, ExtendedDipLogic, SingleEntityLogic};
pub use dips_meta::MetadataRecord;
pub use dips_pack::PackageStream;
pub use dips_types::{Entity, EntityId, EntityKind};
