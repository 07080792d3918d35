//! Filesystem-backed metadata store.
//!
//! One pretty-printed JSON document per record under the store directory,
//! named by [`dips_store::storage_key`] with a `.json` extension. A process
//! level lock serializes read-modify-write cycles.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dips_types::{EntityId, EntityKind};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{MetaError, Result};
use crate::record::{InboundLinks, MetadataRecord};
use crate::traits::{kind_selected, MetadataStore};

/// Metadata store keeping one JSON file per record.
#[derive(Debug)]
pub struct FsMetadataStore {
    dir: PathBuf,
    read_only: bool,
    write_lock: Mutex<()>,
}

impl FsMetadataStore {
    /// Open (or create) a writable store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            read_only: false,
            write_lock: Mutex::new(()),
        })
    }

    /// Open an existing store directory without permitting mutations.
    pub fn open_read_only(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(MetaError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("metadata directory {} does not exist", dir.display()),
            )));
        }
        Ok(Self {
            dir,
            read_only: true,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, id: &EntityId) -> Result<PathBuf> {
        let key = dips_store::storage_key(id)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn read_record(path: &Path) -> Result<Option<MetadataRecord>> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| MetaError::Serialization(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, record: &MetadataRecord) -> Result<()> {
        let path = self.path_for(&record.id)?;
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| MetaError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| MetaError::Io(e.error))?;
        Ok(())
    }
}

impl MetadataStore for FsMetadataStore {
    fn get(&self, id: &EntityId) -> Result<Option<MetadataRecord>> {
        Self::read_record(&self.path_for(id)?)
    }

    fn add(
        &self,
        id: &EntityId,
        kind: EntityKind,
        content_location: Option<&str>,
    ) -> Result<MetadataRecord> {
        let _guard = self.write_lock.lock().map_err(|_| MetaError::Poisoned)?;
        if let Some(existing) = Self::read_record(&self.path_for(id)?)? {
            if existing.kind != kind {
                warn!(%id, recorded = %existing.kind, requested = %kind, "kind differs from existing record; keeping existing");
            }
            return Ok(existing);
        }
        if self.read_only {
            return Err(MetaError::ReadOnly);
        }
        let record = MetadataRecord::new(id.clone(), kind, content_location.map(str::to_string));
        self.write_record(&record)?;
        debug!(%id, %kind, "added metadata record");
        Ok(record)
    }

    fn get_all(&self, kinds: &[EntityKind]) -> Result<Vec<MetadataRecord>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(Some(record)) if kind_selected(kinds, record.kind) => result.push(record),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable metadata record"),
            }
        }
        result.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(result)
    }

    fn remove(&self, id: &EntityId) -> Result<bool> {
        if self.read_only {
            return Err(MetaError::ReadOnly);
        }
        let _guard = self.write_lock.lock().map_err(|_| MetaError::Poisoned)?;
        match fs::remove_file(self.path_for(id)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn merge_links(&self, id: &EntityId, links: &InboundLinks) -> Result<MetadataRecord> {
        if self.read_only {
            return Err(MetaError::ReadOnly);
        }
        let _guard = self.write_lock.lock().map_err(|_| MetaError::Poisoned)?;
        let mut record = Self::read_record(&self.path_for(id)?)?
            .ok_or_else(|| MetaError::NotFound(id.clone()))?;
        let added = record.add_links(links);
        if !links.is_empty() {
            self.write_record(&record)?;
        }
        debug!(%id, added, "merged inbound links");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn store() -> (tempfile::TempDir, FsMetadataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMetadataStore::open(dir.path().join("metadata")).unwrap();
        (dir, store)
    }

    #[test]
    fn records_survive_reopen() {
        let (dir, store) = store();
        store.add(&id("F1"), EntityKind::File, Some("file:///data/f1")).unwrap();
        let links: InboundLinks = [(id("M1"), EntityKind::Manifestation)].into_iter().collect();
        store.merge_links(&id("F1"), &links).unwrap();
        drop(store);

        let reopened = FsMetadataStore::open(dir.path().join("metadata")).unwrap();
        let r = reopened.get(&id("F1")).unwrap().unwrap();
        assert_eq!(r.kind, EntityKind::File);
        assert_eq!(r.content_location.as_deref(), Some("file:///data/f1"));
        assert_eq!(r.inbound_links(), &links);
    }

    #[test]
    fn add_is_idempotent() {
        let (_dir, store) = store();
        let first = store.add(&id("C1"), EntityKind::Collection, None).unwrap();
        let second = store.add(&id("C1"), EntityKind::Collection, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get_all(&[]).unwrap().len(), 1);
    }

    #[test]
    fn get_all_filters_kinds() {
        let (_dir, store) = store();
        store.add(&id("D1"), EntityKind::DeliverableUnit, None).unwrap();
        store.add(&id("E1"), EntityKind::Event, None).unwrap();
        let dus = store.get_all(&[EntityKind::DeliverableUnit]).unwrap();
        assert_eq!(dus.len(), 1);
        assert_eq!(dus[0].id, id("D1"));
    }

    #[test]
    fn get_all_skips_foreign_files() {
        let (_dir, store) = store();
        store.add(&id("D1"), EntityKind::DeliverableUnit, None).unwrap();
        fs::write(store.dir.join("notes.txt"), "ignore me").unwrap();
        fs::write(store.dir.join("broken.json"), "{").unwrap();
        assert_eq!(store.get_all(&[]).unwrap().len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let (_dir, store) = store();
        store.add(&id("E1"), EntityKind::Event, None).unwrap();
        assert!(store.remove(&id("E1")).unwrap());
        assert!(!store.remove(&id("E1")).unwrap());
        assert!(store.get(&id("E1")).unwrap().is_none());
    }

    #[test]
    fn read_only_open_refuses_writes() {
        let (dir, store) = store();
        store.add(&id("C1"), EntityKind::Collection, None).unwrap();
        drop(store);

        let ro = FsMetadataStore::open_read_only(dir.path().join("metadata")).unwrap();
        assert!(ro.is_read_only());
        assert!(ro.get(&id("C1")).unwrap().is_some());
        assert!(matches!(
            ro.merge_links(&id("C1"), &InboundLinks::new()),
            Err(MetaError::ReadOnly)
        ));
        assert!(matches!(
            ro.add(&id("C2"), EntityKind::Collection, None),
            Err(MetaError::ReadOnly)
        ));
    }

    #[test]
    fn rewrites_leave_only_record_files() {
        let (_dir, store) = store();
        store.add(&id("C1"), EntityKind::Collection, None).unwrap();
        for source in ["D1", "D2", "D3"] {
            let links: InboundLinks = [(id(source), EntityKind::DeliverableUnit)].into_iter().collect();
            store.merge_links(&id("C1"), &links).unwrap();
        }
        let names: Vec<String> = fs::read_dir(&store.dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1, "{names:?}");
        assert!(names[0].ends_with(".json"));
        assert_eq!(store.get(&id("C1")).unwrap().unwrap().inbound_links().len(), 3);
    }

    #[test]
    fn read_only_open_requires_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsMetadataStore::open_read_only(dir.path().join("absent")).is_err());
    }
}
