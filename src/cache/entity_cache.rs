//! Bounded entity cache with insertion-order eviction.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::CacheConfig;
use crate::entity::Entity;
use crate::error::{EntityKind, MirrorError, Result};
use crate::snowflake::Snowflake;

/// A shared handle onto a cached entity.
///
/// Handles stay valid after the entity is evicted or removed; the cache only
/// drops its own slot. Patches applied while the entity is still cached are
/// visible through every outstanding handle.
///
/// Do not hold a [`Cached::read`] guard while patching the same entity
/// through its cache: the patch waits for the guard, and the cache stays
/// write-locked until it gets it. Copy out with [`Cached::snapshot`] instead.
pub struct Cached<T>(Arc<RwLock<T>>);

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Cached<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Lock the entity for reading.
    ///
    /// Keep the guard short-lived; patches to this entity block until it drops.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Whether two handles point at the same entity.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Cached<T> {
    /// Copy the current state out of the handle.
    pub fn snapshot(&self) -> T {
        self.0.read().clone()
    }
}

impl<T: Entity> Cached<T> {
    pub fn id(&self) -> Snowflake {
        self.0.read().id()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Cached").field(&*self.0.read()).finish()
    }
}

struct Slot<T> {
    seq: u64,
    entity: Cached<T>,
}

struct Inner<T> {
    slots: HashMap<Snowflake, Slot<T>>,
    /// Insertion sequence -> id, oldest first.
    order: BTreeMap<u64, Snowflake>,
    next_seq: u64,
}

impl<T> Inner<T> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn push(&mut self, id: Snowflake, entity: Cached<T>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id);
        self.slots.insert(id, Slot { seq, entity });
    }

    fn take(&mut self, id: &Snowflake) -> Option<Cached<T>> {
        let slot = self.slots.remove(id)?;
        self.order.remove(&slot.seq);
        Some(slot.entity)
    }

    fn snapshot(&self) -> Vec<Cached<T>> {
        self.order
            .values()
            .filter_map(|id| self.slots.get(id))
            .map(|slot| slot.entity.clone())
            .collect()
    }
}

/// A keyed store of entities bounded by capacity.
///
/// This cache is:
/// - Thread-safe (one lock per cache instance, mutations are serialized)
/// - FIFO-bounded: once full, inserting a new id evicts the oldest inserted
/// - Clone-friendly (cloning is cheap, shares the same underlying store)
pub struct EntityCache<T> {
    inner: Arc<RwLock<Inner<T>>>,
    kind: EntityKind,
    config: CacheConfig,
}

// Manual Clone implementation that doesn't require T: Clone
impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            kind: self.kind,
            config: self.config,
        }
    }
}

impl<T: Entity> EntityCache<T> {
    /// Create a new cache for `T` with the given config.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_kind(T::KIND, config)
    }

    /// Create a cache that reports itself as `kind` in errors.
    ///
    /// Threads share the channel record type but live in their own cache.
    pub fn with_kind(kind: EntityKind, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new())),
            kind,
            config,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Configured capacity, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.config.limit()
    }

    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().slots.is_empty()
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        self.inner.read().slots.contains_key(&id)
    }

    /// Get an entity from the cache.
    pub fn get(&self, id: Snowflake) -> Option<Cached<T>> {
        self.inner.read().slots.get(&id).map(|slot| slot.entity.clone())
    }

    /// Get an entity, failing with `NotCached` when absent.
    pub fn require(&self, id: Snowflake) -> Result<Cached<T>> {
        self.get(id)
            .ok_or_else(|| MirrorError::not_cached(self.kind, id))
    }

    /// Patch the entity at `id` in place, or construct and insert it.
    ///
    /// When the entry exists its insertion position is kept. When it does not,
    /// `construct` builds it from the patch; a construction failure is returned
    /// and the cache is left untouched.
    pub fn update_or_insert<F>(&self, id: Snowflake, patch: &T::Patch, construct: F) -> Result<Cached<T>>
    where
        F: FnOnce(Snowflake, &T::Patch) -> Result<T>,
    {
        let mut inner = self.inner.write();

        if let Some(slot) = inner.slots.get(&id) {
            slot.entity.write().apply_patch(patch);
            debug!("Patched {} {}", self.kind, id);
            return Ok(slot.entity.clone());
        }

        let entity = Cached::new(construct(id, patch)?);
        inner.push(id, entity.clone());
        debug!("Inserted {} {}", self.kind, id);
        self.evict_overflow(&mut inner);

        Ok(entity)
    }

    /// Patch the entity at `id` in place if it is still cached.
    ///
    /// Never inserts; an absent id leaves the cache untouched.
    pub fn patch(&self, id: Snowflake, patch: &T::Patch) -> Option<Cached<T>> {
        let inner = self.inner.read();
        let slot = inner.slots.get(&id)?;
        slot.entity.write().apply_patch(patch);
        debug!("Patched {} {}", self.kind, id);
        Some(slot.entity.clone())
    }

    /// Patch or insert using the entity's own constructor.
    pub fn upsert(&self, id: Snowflake, patch: &T::Patch) -> Result<Cached<T>> {
        self.update_or_insert(id, patch, T::from_patch)
    }

    /// Insert a fully built entity, replacing any entry with the same id.
    ///
    /// A replaced entry keeps its insertion position; handles to the old
    /// value keep observing the old value.
    pub fn insert(&self, entity: T) -> Cached<T> {
        let id = entity.id();
        let entity = Cached::new(entity);
        let mut inner = self.inner.write();

        if let Some(slot) = inner.slots.get_mut(&id) {
            slot.entity = entity.clone();
            debug!("Replaced {} {}", self.kind, id);
            return entity;
        }

        inner.push(id, entity.clone());
        debug!("Inserted {} {}", self.kind, id);
        self.evict_overflow(&mut inner);
        entity
    }

    /// Remove an entity, e.g. after a remote delete.
    pub fn remove(&self, id: Snowflake) -> Option<Cached<T>> {
        let removed = self.inner.write().take(&id);
        if removed.is_some() {
            debug!("Removed {} {}", self.kind, id);
        }
        removed
    }

    /// Remove all entries from the cache.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.slots.clear();
        inner.order.clear();
        debug!("Cleared {} cache", self.kind);
    }

    /// Cached ids, oldest first.
    pub fn ids(&self) -> Vec<Snowflake> {
        self.inner.read().order.values().copied().collect()
    }

    /// Iterate entities in insertion order.
    ///
    /// The sequence is taken from a snapshot of the index, so each call starts
    /// fresh and later inserts or evictions do not disturb it.
    pub fn values(&self) -> impl Iterator<Item = Cached<T>> + use<T> {
        self.inner.read().snapshot().into_iter()
    }

    /// First entity, in insertion order, matching `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<Cached<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.values().find(|entity| predicate(&entity.read()))
    }

    /// All entities matching `predicate`, in insertion order.
    pub fn filter<P>(&self, mut predicate: P) -> impl Iterator<Item = Cached<T>> + use<T, P>
    where
        P: FnMut(&T) -> bool,
    {
        self.values().filter(move |entity| predicate(&entity.read()))
    }

    fn evict_overflow(&self, inner: &mut Inner<T>) {
        let Some(limit) = self.config.limit() else {
            return;
        };

        while inner.slots.len() > limit {
            let Some((_, oldest)) = inner.order.pop_first() else {
                break;
            };
            inner.slots.remove(&oldest);
            debug!("Evicted {} {} (capacity {})", self.kind, oldest, limit);
        }
    }
}

impl<T> std::fmt::Debug for EntityCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCache")
            .field("kind", &self.kind)
            .field("entry_count", &self.inner.read().slots.len())
            .field("max_capacity", &self.config.max_capacity)
            .finish()
    }
}
