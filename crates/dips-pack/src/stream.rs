//! Lazily-readable package documents.
//!
//! A [`PackageStream`] is a queue of segments. Fixed markers are emitted as
//! literal bytes and every entity segment opens its blob only when the read
//! position reaches it, releasing it as soon as it is exhausted.

use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use dips_assemble::AssembledPackage;
use dips_store::{BlobReader, EntityStore};
use dips_types::{EntityId, EntityKind};
use tracing::{debug, warn};

pub const PACKAGE_OPEN: &str = "<XIP>";
pub const PACKAGE_CLOSE: &str = "</XIP>";

/// Container tag name for entities of `kind`.
pub fn container_tag(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Collection => "Collections",
        EntityKind::DeliverableUnit => "DeliverableUnits",
        EntityKind::Manifestation => "Manifestations",
        EntityKind::File => "Files",
        EntityKind::Event => "Events",
    }
}

/// Placeholder emitted in place of a blob the store no longer holds.
pub fn missing_placeholder(id: &EntityId) -> String {
    format!("<!-- missing entity: {id} -->")
}

enum Segment {
    Marker(String),
    Entity(EntityId),
}

enum Active {
    Literal(Cursor<Vec<u8>>),
    Blob(BlobReader),
}

impl Read for Active {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Literal(c) => c.read(buf),
            Self::Blob(r) => r.read(buf),
        }
    }
}

/// The serialized form of an [`AssembledPackage`], readable as a byte stream.
///
/// Kinds appear in [`EntityKind::SERIALIZATION_ORDER`]; kinds with no ids
/// are omitted entirely. At most one entity blob is open at any time.
pub struct PackageStream {
    entities: Arc<dyn EntityStore>,
    queue: VecDeque<Segment>,
    current: Option<Active>,
    missing: Vec<EntityId>,
    closed: bool,
}

impl PackageStream {
    pub fn new(entities: Arc<dyn EntityStore>, package: &AssembledPackage) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(Segment::Marker(PACKAGE_OPEN.to_string()));
        for kind in EntityKind::SERIALIZATION_ORDER {
            let mut ids = package.ids(kind).peekable();
            if ids.peek().is_none() {
                continue;
            }
            let tag = container_tag(kind);
            queue.push_back(Segment::Marker(format!("<{tag}>")));
            queue.extend(ids.cloned().map(Segment::Entity));
            queue.push_back(Segment::Marker(format!("</{tag}>")));
        }
        queue.push_back(Segment::Marker(PACKAGE_CLOSE.to_string()));

        Self {
            entities,
            queue,
            current: None,
            missing: Vec::new(),
            closed: false,
        }
    }

    /// Ids whose blobs were missing when their segment was reached.
    pub fn missing(&self) -> &[EntityId] {
        &self.missing
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release any open blob and discard the remaining segments.
    ///
    /// Subsequent reads return end of stream. Calling `close` twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.current = None;
        let skipped = self.queue.len();
        self.queue.clear();
        self.closed = true;
        debug!(skipped, "package stream closed");
    }

    fn open_next(&mut self) -> io::Result<Option<Active>> {
        let Some(segment) = self.queue.pop_front() else {
            return Ok(None);
        };
        let active = match segment {
            Segment::Marker(text) => Active::Literal(Cursor::new(text.into_bytes())),
            Segment::Entity(id) => match self.entities.open(&id) {
                Ok(reader) => Active::Blob(reader),
                Err(e) if e.is_not_found() => {
                    warn!(%id, "entity blob missing while serializing package");
                    let placeholder = missing_placeholder(&id);
                    self.missing.push(id);
                    Active::Literal(Cursor::new(placeholder.into_bytes()))
                }
                Err(e) => return Err(io::Error::other(e)),
            },
        };
        Ok(Some(active))
    }
}

impl Read for PackageStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.closed {
            return Ok(0);
        }
        loop {
            if self.current.is_none() {
                match self.open_next()? {
                    Some(active) => self.current = Some(active),
                    None => return Ok(0),
                }
            }
            if let Some(active) = self.current.as_mut() {
                let n = active.read(buf)?;
                if n > 0 {
                    return Ok(n);
                }
            }
            self.current = None;
        }
    }
}

impl Drop for PackageStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PackageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageStream")
            .field("pending", &self.queue.len())
            .field("open", &self.current.is_some())
            .field("missing", &self.missing)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dips_store::{InMemoryEntityStore, StoreResult};

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn store_with(blobs: &[(&str, &str)]) -> Arc<InMemoryEntityStore> {
        let store = InMemoryEntityStore::new();
        for (k, v) in blobs {
            store.put(&id(k), v.as_bytes()).unwrap();
        }
        Arc::new(store)
    }

    fn read_all(stream: &mut PackageStream) -> String {
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    }

    /// Counts blobs that are currently open.
    struct CountingStore {
        inner: InMemoryEntityStore,
        open: Arc<AtomicUsize>,
    }

    struct CountedReader {
        inner: BlobReader,
        open: Arc<AtomicUsize>,
    }

    impl Read for CountedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Drop for CountedReader {
        fn drop(&mut self) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl EntityStore for CountingStore {
        fn put(&self, id: &EntityId, bytes: &[u8]) -> StoreResult<()> {
            self.inner.put(id, bytes)
        }
        fn get(&self, id: &EntityId) -> StoreResult<Vec<u8>> {
            self.inner.get(id)
        }
        fn remove(&self, id: &EntityId) -> StoreResult<()> {
            self.inner.remove(id)
        }
        fn contains(&self, id: &EntityId) -> StoreResult<bool> {
            self.inner.contains(id)
        }
        fn open(&self, id: &EntityId) -> StoreResult<BlobReader> {
            let inner = self.inner.open(id)?;
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountedReader {
                inner,
                open: Arc::clone(&self.open),
            }))
        }
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    #[test]
    fn empty_package_is_just_the_envelope() {
        let mut s = PackageStream::new(store_with(&[]), &AssembledPackage::new());
        assert_eq!(read_all(&mut s), "<XIP></XIP>");
    }

    #[test]
    fn kinds_follow_fixed_order() {
        let store = store_with(&[("E1", "e"), ("F1", "f"), ("C1", "c"), ("D1", "d")]);
        // Inserted in an order unrelated to the output order.
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::Event, id("E1"));
        pkg.insert(EntityKind::File, id("F1"));
        pkg.insert(EntityKind::Collection, id("C1"));
        pkg.insert(EntityKind::DeliverableUnit, id("D1"));

        let mut s = PackageStream::new(store, &pkg);
        assert_eq!(
            read_all(&mut s),
            "<XIP><DeliverableUnits>d</DeliverableUnits><Collections>c</Collections>\
             <Files>f</Files><Events>e</Events></XIP>"
        );
    }

    #[test]
    fn several_ids_of_one_kind_are_concatenated() {
        let store = store_with(&[("F1", "one"), ("F2", "two")]);
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::File, id("F2"));
        pkg.insert(EntityKind::File, id("F1"));
        let mut s = PackageStream::new(store, &pkg);
        assert_eq!(read_all(&mut s), "<XIP><Files>onetwo</Files></XIP>");
    }

    // -----------------------------------------------------------------------
    // Missing blobs
    // -----------------------------------------------------------------------

    #[test]
    fn missing_blob_becomes_placeholder() {
        let store = store_with(&[("D1", "d")]);
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::DeliverableUnit, id("D1"));
        pkg.insert(EntityKind::DeliverableUnit, id("D2"));

        let mut s = PackageStream::new(store, &pkg);
        let out = read_all(&mut s);
        assert_eq!(
            out,
            "<XIP><DeliverableUnits>d<!-- missing entity: D2 --></DeliverableUnits></XIP>"
        );
        assert_eq!(s.missing(), &[id("D2")]);
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    #[test]
    fn byte_at_a_time_matches_bulk_read() {
        let store = store_with(&[("C1", "collection"), ("D1", "unit")]);
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::Collection, id("C1"));
        pkg.insert(EntityKind::DeliverableUnit, id("D1"));

        let bulk = read_all(&mut PackageStream::new(store.clone(), &pkg));

        let mut s = PackageStream::new(store, &pkg);
        let mut bytes = Vec::new();
        let mut one = [0u8; 1];
        loop {
            match s.read(&mut one).unwrap() {
                0 => break,
                n => bytes.extend_from_slice(&one[..n]),
            }
        }
        assert_eq!(String::from_utf8(bytes).unwrap(), bulk);
    }

    #[test]
    fn empty_buffer_reads_zero() {
        let mut s = PackageStream::new(store_with(&[]), &AssembledPackage::new());
        assert_eq!(s.read(&mut []).unwrap(), 0);
        assert_eq!(read_all(&mut s), "<XIP></XIP>");
    }

    // -----------------------------------------------------------------------
    // Resource release
    // -----------------------------------------------------------------------

    #[test]
    fn at_most_one_blob_open_and_all_released() {
        let open = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: InMemoryEntityStore::new(),
            open: Arc::clone(&open),
        };
        for n in ["F1", "F2", "F3"] {
            store.put(&id(n), b"xyz").unwrap();
        }
        let mut pkg = AssembledPackage::new();
        for n in ["F1", "F2", "F3"] {
            pkg.insert(EntityKind::File, id(n));
        }

        let mut s = PackageStream::new(Arc::new(store), &pkg);
        let mut buf = [0u8; 2];
        while s.read(&mut buf).unwrap() > 0 {
            assert!(open.load(Ordering::SeqCst) <= 1);
        }
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn early_close_releases_open_blob() {
        let open = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: InMemoryEntityStore::new(),
            open: Arc::clone(&open),
        };
        store.put(&id("F1"), b"a long enough blob").unwrap();
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::File, id("F1"));

        let mut s = PackageStream::new(Arc::new(store), &pkg);
        // "<XIP>" then "<Files>" then the first bytes of F1.
        let mut buf = [0u8; 4];
        let mut read = 0;
        while read < "<XIP><Files>".len() + 1 {
            read += s.read(&mut buf).unwrap();
        }
        assert_eq!(open.load(Ordering::SeqCst), 1);

        s.close();
        assert!(s.is_closed());
        assert_eq!(open.load(Ordering::SeqCst), 0);
        assert_eq!(s.read(&mut buf).unwrap(), 0);
        s.close();
    }

    #[test]
    fn drop_releases_open_blob() {
        let open = Arc::new(AtomicUsize::new(0));
        let store = CountingStore {
            inner: InMemoryEntityStore::new(),
            open: Arc::clone(&open),
        };
        store.put(&id("D1"), b"unit").unwrap();
        let mut pkg = AssembledPackage::new();
        pkg.insert(EntityKind::DeliverableUnit, id("D1"));

        {
            let mut s = PackageStream::new(Arc::new(store), &pkg);
            let mut buf = [0u8; 1];
            while open.load(Ordering::SeqCst) == 0 {
                assert_eq!(s.read(&mut buf).unwrap(), 1);
            }
        }
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }
}
