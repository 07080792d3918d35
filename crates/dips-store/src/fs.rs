//! Filesystem-backed entity store.
//!
//! Each blob lives in its own file under the store directory. File names are
//! derived from the entity id so that arbitrary id strings are safe to use:
//!
//! ```text
//! <dir>/<hex(id)>            ids up to 100 bytes
//! <dir>/b3-<blake3(id)>      longer ids
//! ```
//!
//! Writes go through a temporary file in the same directory and are renamed
//! into place, so readers never observe a partially written blob.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use dips_types::EntityId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobReader, EntityStore};

/// Ids longer than this are stored under a digest of the id.
const MAX_HEX_ID_BYTES: usize = 100;

/// Entity store keeping one file per blob in a directory.
#[derive(Debug)]
pub struct FsEntityStore {
    dir: PathBuf,
}

impl FsEntityStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The directory blobs are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &EntityId) -> StoreResult<PathBuf> {
        Ok(self.dir.join(storage_key(id)?))
    }
}

/// File-system-safe key for an entity id.
///
/// Shared with other on-disk indexes keyed by entity id.
pub fn storage_key(id: &EntityId) -> StoreResult<String> {
    let bytes = id.as_str().as_bytes();
    if bytes.is_empty() {
        return Err(StoreError::InvalidId(String::new()));
    }
    if bytes.len() <= MAX_HEX_ID_BYTES {
        Ok(hex::encode(bytes))
    } else {
        Ok(format!("b3-{}", blake3::hash(bytes).to_hex()))
    }
}

impl EntityStore for FsEntityStore {
    fn put(&self, id: &EntityId, bytes: &[u8]) -> StoreResult<()> {
        let path = self.path_for(id)?;

        match fs::read(&path) {
            Ok(existing) if blake3::hash(&existing) == blake3::hash(bytes) => {
                debug!(%id, "identical blob already stored");
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(%id, len = bytes.len(), "stored blob");
        Ok(())
    }

    fn get(&self, id: &EntityId) -> StoreResult<Vec<u8>> {
        let path = self.path_for(id)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id.clone()),
            _ => StoreError::Io(e),
        })
    }

    fn remove(&self, id: &EntityId) -> StoreResult<()> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, id: &EntityId) -> StoreResult<bool> {
        Ok(self.path_for(id)?.is_file())
    }

    fn open(&self, id: &EntityId) -> StoreResult<BlobReader> {
        let path = self.path_for(id)?;
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(id.clone()),
            _ => StoreError::Io(e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn store() -> (tempfile::TempDir, FsEntityStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEntityStore::open(dir.path().join("entities")).unwrap();
        (dir, store)
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, store) = store();
        let id = EntityId::new("D1");
        store.put(&id, b"du bytes").unwrap();
        assert_eq!(store.get(&id).unwrap(), b"du bytes");
        assert!(store.contains(&id).unwrap());
    }

    #[test]
    fn identical_put_keeps_file() {
        let (_dir, store) = store();
        let id = EntityId::new("C1");
        store.put(&id, b"same").unwrap();
        let path = store.path_for(&id).unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();
        store.put(&id, b"same").unwrap();
        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn different_put_replaces() {
        let (_dir, store) = store();
        let id = EntityId::new("C1");
        store.put(&id, b"v1").unwrap();
        store.put(&id, b"v2-longer").unwrap();
        assert_eq!(store.get(&id).unwrap(), b"v2-longer");
    }

    #[test]
    fn missing_blob_is_not_found() {
        let (_dir, store) = store();
        let id = EntityId::new("ghost");
        assert!(store.get(&id).unwrap_err().is_not_found());
        assert!(matches!(store.open(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn remove_tolerates_missing() {
        let (_dir, store) = store();
        let id = EntityId::new("E1");
        store.remove(&id).unwrap();
        store.put(&id, b"event").unwrap();
        store.remove(&id).unwrap();
        assert!(!store.contains(&id).unwrap());
    }

    #[test]
    fn ids_with_path_characters_are_safe() {
        let (_dir, store) = store();
        let id = EntityId::new("../../etc/passwd");
        store.put(&id, b"contained").unwrap();
        let path = store.path_for(&id).unwrap();
        assert_eq!(path.parent().unwrap(), store.dir());
        assert_eq!(store.get(&id).unwrap(), b"contained");
    }

    #[test]
    fn long_ids_use_digest_names() {
        let (_dir, store) = store();
        let id = EntityId::new("x".repeat(400));
        store.put(&id, b"long").unwrap();
        let name = store.path_for(&id).unwrap();
        assert!(name.file_name().unwrap().to_string_lossy().starts_with("b3-"));
        assert_eq!(store.get(&id).unwrap(), b"long");
    }

    #[test]
    fn empty_id_is_rejected() {
        let (_dir, store) = store();
        let err = store.put(&EntityId::new(""), b"x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }

    #[test]
    fn open_streams_from_disk() {
        let (_dir, store) = store();
        let id = EntityId::new("F1");
        store.put(&id, b"streamed").unwrap();
        let mut buf = Vec::new();
        store.open(&id).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"streamed");
    }
}
