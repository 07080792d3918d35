//! The graph-walking package assembler.
//!
//! Starting from a seed id, the assembler repeatedly asks a [`DipLogic`]
//! which entities are relevant, expanding a frontier of candidates until it
//! is exhausted. Each assembly owns its own [`Traversal`] state, so any
//! number of assemblies may run against the same stores at once.
//!
//! # Invariants
//!
//! - Every id is visited at most once per assembly. An id is marked as
//!   scheduled *before* it is pushed on the work stack, so cycles in the
//!   relation graph terminate.
//! - Accepted and banned ids are disjoint.
//! - Candidates without a metadata record, and non-seed entities without a
//!   stored blob, are logged and skipped. Only a missing seed is fatal.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use dips_meta::{MetadataRecord, MetadataStore};
use dips_store::{EntityStore, StoreError};
use dips_types::{EntityId, EntityKind};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AssembleError, AssembleResult};
use crate::logic::DipLogic;

// ---------------------------------------------------------------------------
// AssembledPackage
// ---------------------------------------------------------------------------

/// Accepted entity ids grouped by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssembledPackage {
    entries: BTreeMap<EntityKind, BTreeSet<EntityId>>,
}

impl AssembledPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` under `kind`. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: EntityKind, id: EntityId) -> bool {
        self.entries.entry(kind).or_default().insert(id)
    }

    /// Whether `id` is recorded under `kind`.
    pub fn contains(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.entries.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    /// Whether `id` is recorded under any kind.
    pub fn contains_id(&self, id: &EntityId) -> bool {
        self.entries.values().any(|ids| ids.contains(id))
    }

    /// Ids recorded under `kind`, in id order. Empty if none.
    pub fn ids(&self, kind: EntityKind) -> impl Iterator<Item = &EntityId> + '_ {
        self.entries.get(&kind).into_iter().flatten()
    }

    /// Kinds with at least one id.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.entries
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(kind, _)| *kind)
    }

    /// Total number of ids across all kinds.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every `(kind, id)` pair, grouped by kind.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &EntityId)> + '_ {
        self.entries
            .iter()
            .flat_map(|(kind, ids)| ids.iter().map(move |id| (*kind, id)))
    }
}

// ---------------------------------------------------------------------------
// Traversal state
// ---------------------------------------------------------------------------

/// Mutable state of one assembly request.
#[derive(Debug, Default)]
pub struct Traversal {
    accepted: AssembledPackage,
    banned: BTreeSet<EntityId>,
    dangling: BTreeSet<EntityId>,
    scheduled: HashSet<EntityId>,
}

impl Traversal {
    fn accept(&mut self, kind: EntityKind, id: &EntityId) {
        debug!(%id, %kind, "accepted");
        self.accepted.insert(kind, id.clone());
    }

    fn ban(&mut self, id: &EntityId) {
        debug!(%id, "rejected");
        self.banned.insert(id.clone());
    }

    fn dangle(&mut self, id: &EntityId) {
        self.dangling.insert(id.clone());
    }

    /// Mark `id` as scheduled. Returns `false` if it already was.
    fn schedule(&mut self, id: &EntityId) -> bool {
        self.scheduled.insert(id.clone())
    }
}

/// Everything one assembly learned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyOutcome {
    /// The derived package.
    pub package: AssembledPackage,
    /// Ids the policy rejected.
    pub banned: BTreeSet<EntityId>,
    /// Candidates skipped because the archive holds no record or blob.
    pub dangling: BTreeSet<EntityId>,
}

impl From<Traversal> for AssemblyOutcome {
    fn from(t: Traversal) -> Self {
        Self {
            package: t.accepted,
            banned: t.banned,
            dangling: t.dangling,
        }
    }
}

// ---------------------------------------------------------------------------
// PackageAssembler
// ---------------------------------------------------------------------------

/// Walks the relation graph from a seed under one policy.
///
/// The assembler borrows the stores and the policy for the duration of a
/// request and holds no state between requests.
pub struct PackageAssembler<'a> {
    entities: &'a dyn EntityStore,
    metadata: &'a dyn MetadataStore,
    logic: &'a dyn DipLogic,
}

impl<'a> PackageAssembler<'a> {
    pub fn new(
        entities: &'a dyn EntityStore,
        metadata: &'a dyn MetadataStore,
        logic: &'a dyn DipLogic,
    ) -> Self {
        Self {
            entities,
            metadata,
            logic,
        }
    }

    /// Assemble the package rooted at `seed`.
    ///
    /// Fails with [`AssembleError::NotFound`] if the seed has no metadata
    /// record or no stored blob.
    pub fn assemble(&self, seed: &EntityId) -> AssembleResult<AssemblyOutcome> {
        let root = self
            .metadata
            .get(seed)?
            .ok_or_else(|| AssembleError::NotFound(seed.clone()))?;

        let mut state = Traversal::default();
        state.schedule(seed);
        let mut stack: Vec<(MetadataRecord, bool)> = vec![(root, true)];

        while let Some((record, is_root)) = stack.pop() {
            let candidates = match self.visit(&record, is_root) {
                Ok(candidates) => candidates,
                Err(AssembleError::Store(StoreError::NotFound(id))) => {
                    if is_root {
                        return Err(AssembleError::NotFound(id));
                    }
                    warn!(%id, "entity has metadata but no stored blob; skipping");
                    state.dangle(&id);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let next = self.settle(&mut state, &record, candidates)?;
            // Reverse so candidates are explored in id order.
            stack.extend(next.into_iter().rev().map(|r| (r, false)));
        }

        let outcome = AssemblyOutcome::from(state);
        info!(
            seed = %seed,
            logic = self.logic.name(),
            accepted = outcome.package.len(),
            banned = outcome.banned.len(),
            dangling = outcome.dangling.len(),
            "package assembled"
        );
        Ok(outcome)
    }

    /// Open the entity's content and run the policy on it.
    ///
    /// The content reader is dropped before this returns on every path.
    fn visit(&self, record: &MetadataRecord, is_root: bool) -> AssembleResult<BTreeSet<EntityId>> {
        let mut content = self.entities.open(&record.id)?;
        self.logic
            .extract(&record.id, content.as_mut(), record, is_root)
    }

    /// Record the verdict on `record` and return the candidates that still
    /// need a visit.
    fn settle(
        &self,
        state: &mut Traversal,
        record: &MetadataRecord,
        mut candidates: BTreeSet<EntityId>,
    ) -> AssembleResult<Vec<MetadataRecord>> {
        if candidates.remove(&record.id) {
            state.accept(record.kind, &record.id);
        } else {
            state.ban(&record.id);
        }

        let mut next = Vec::new();
        for cid in candidates {
            let Some(candidate) = self.metadata.get(&cid)? else {
                warn!(id = %cid, from = %record.id, "candidate not held by this archive; skipping");
                state.dangle(&cid);
                continue;
            };
            if state.accepted.contains(candidate.kind, &cid) || state.banned.contains(&cid) {
                continue;
            }
            if !state.schedule(&cid) {
                continue;
            }
            next.push(candidate);
        }
        Ok(next)
    }
}
