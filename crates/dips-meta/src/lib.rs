//! Metadata records and the inbound-link index.
//!
//! Every ingested entity has one [`MetadataRecord`] holding its kind, its
//! optional external content location, and an append-only map of the
//! entities that link to it. The [`LinkFinder`] derives those inbound maps
//! from the outbound references of newly ingested entities.
//!
//! # Modules
//!
//! - [`error`] — Error types for metadata operations
//! - [`record`] — [`MetadataRecord`] and the [`InboundLinks`] merge rule
//! - [`traits`] — The [`MetadataStore`] trait
//! - [`links`] — [`LinkFinder`] and [`OutboundLinks`]
//! - [`memory`] — [`InMemoryMetadataStore`], writable or read-only
//! - [`fs`] — [`FsMetadataStore`], one JSON document per record

pub mod error;
pub mod fs;
pub mod links;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{MetaError, Result};
pub use fs::FsMetadataStore;
pub use links::{LinkFinder, OutboundLinks};
pub use memory::InMemoryMetadataStore;
pub use record::{InboundLinks, MetadataRecord};
pub use traits::MetadataStore;
