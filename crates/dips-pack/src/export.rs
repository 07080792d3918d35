use std::io::{self, Read, Write};

use tracing::debug;

use crate::error::{PackError, PackResult};

/// Copy a package document into `out` unchanged. Returns the bytes written.
pub fn export<R: Read, W: Write>(mut package: R, mut out: W) -> PackResult<u64> {
    let written = io::copy(&mut package, &mut out)?;
    out.flush()?;
    debug!(bytes = written, "package exported");
    Ok(written)
}

/// Copy a package document into `out` through a zstd encoder.
///
/// Returns the number of uncompressed bytes consumed from `package`.
pub fn export_compressed<R: Read, W: Write>(mut package: R, out: W, level: i32) -> PackResult<u64> {
    if !zstd::compression_level_range().contains(&level) {
        return Err(PackError::InvalidLevel(level));
    }
    let mut encoder = zstd::Encoder::new(out, level)?;
    let consumed = io::copy(&mut package, &mut encoder)?;
    let mut out = encoder.finish()?;
    out.flush()?;
    debug!(bytes = consumed, level, "package exported (zstd)");
    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dips_assemble::AssembledPackage;
    use dips_store::{EntityStore, InMemoryEntityStore};
    use dips_types::{EntityId, EntityKind};

    use crate::stream::PackageStream;

    fn stream() -> PackageStream {
        let store = InMemoryEntityStore::new();
        let body = "x".repeat(4096);
        store.put(&EntityId::new("F1"), body.as_bytes()).unwrap();
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::File, EntityId::new("F1"));
        PackageStream::new(Arc::new(store), &pkg)
    }

    #[test]
    fn plain_export_copies_everything() {
        let mut out = Vec::new();
        let n = export(stream(), &mut out).unwrap();
        assert_eq!(n as usize, out.len());
        assert!(out.starts_with(b"<XIP><Files>"));
        assert!(out.ends_with(b"</Files></XIP>"));
    }

    #[test]
    fn compressed_export_decodes_to_original() {
        let mut plain = Vec::new();
        export(stream(), &mut plain).unwrap();

        let mut packed = Vec::new();
        let n = export_compressed(stream(), &mut packed, 3).unwrap();
        assert_eq!(n as usize, plain.len());
        assert!(packed.len() < plain.len());
        assert_eq!(zstd::decode_all(packed.as_slice()).unwrap(), plain);
    }

    #[test]
    fn compressed_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.xip.zst");
        let file = std::fs::File::create(&path).unwrap();
        export_compressed(stream(), file, 19).unwrap();
        let decoded = zstd::decode_all(std::fs::File::open(&path).unwrap()).unwrap();
        assert!(decoded.starts_with(b"<XIP>"));
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let err = export_compressed(stream(), Vec::new(), 1000).unwrap_err();
        assert!(matches!(err, PackError::InvalidLevel(1000)));
    }
}
