//! Foundation types for the package-assembly archive.
//!
//! Every other `dips` crate depends on `dips-types`.
//!
//! # Key Types
//!
//! - [`EntityId`] — opaque, globally unique entity identifier
//! - [`EntityKind`] — the closed five-way classification of entities
//! - [`Entity`] — the parsed entity model with its outbound references
//! - [`EntityCodec`] — parse/serialize boundary, with [`JsonCodec`] as reference

pub mod codec;
pub mod entity;
pub mod error;
pub mod id;
pub mod kind;

pub use codec::{EntityCodec, JsonCodec, PackageDocument};
pub use entity::{Collection, DeliverableUnit, Entity, Event, FileEntity, Manifestation, Relation};
pub use error::TypeError;
pub use id::EntityId;
pub use kind::EntityKind;
