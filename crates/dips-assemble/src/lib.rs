//! Extraction policies and the package assembler.
//!
//! A disseminated package is the sub-graph of archived entities that one
//! [`DipLogic`] considers relevant to a seed entity. The
//! [`PackageAssembler`] derives it by walking the relation graph.
//!
//! - [`SingleEntityLogic`] -- just the seed
//! - [`ExtendedDipLogic`] -- the seed with its parents, metadata, files and,
//!   from the seed only, the entities that point at it

pub mod assembler;
pub mod error;
pub mod logic;

pub use assembler::{AssembledPackage, AssemblyOutcome, PackageAssembler, Traversal};
pub use error::{AssembleError, AssembleResult};
pub use logic::{DipLogic, ExtendedDipLogic, SingleEntityLogic};
