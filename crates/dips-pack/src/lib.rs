//! Package stream serialization.
//!
//! Turns an [`AssembledPackage`](dips_assemble::AssembledPackage) into a
//! single readable document:
//!
//! ```text
//! <XIP>
//!   <DeliverableUnits> blob blob ... </DeliverableUnits>
//!   <Collections> ... </Collections>
//!   <Manifestations> ... </Manifestations>
//!   <Files> ... </Files>
//!   <Events> ... </Events>
//! </XIP>
//! ```
//!
//! Whitespace above is for illustration only; markers and blobs are emitted
//! back to back. Empty kinds are omitted.

pub mod error;
pub mod export;
pub mod stream;

pub use error::{PackError, PackResult};
pub use export::{export, export_compressed};
pub use stream::{container_tag, missing_placeholder, PackageStream, PACKAGE_CLOSE, PACKAGE_OPEN};
