//! The entity store and its fragment/modify/evict operations.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use canopy_types::{EntityKey, FieldMap, FieldName, FieldValue, NodeId, TypeName};

use crate::entity::Entity;

/// Whether a write should notify dependent queries.
///
/// `Silent` updates the store without recording the key in the broadcast
/// journal. Used by the lazy parent backfill, where a derived field is
/// written during a read and unrelated consumers must not recompute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Broadcast {
    Notify,
    Silent,
}

/// Result of a field updater: keep a (possibly new) value, or remove the
/// field entry entirely.
///
/// The tagged form replaces an in-band "DELETE" sentinel value: removal is
/// a distinct variant, not a magic value that could collide with data.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldUpdate {
    Keep(FieldValue),
    Remove,
}

/// One named field transform, for [`EntityStore::modify_many`].
///
/// The updater must be a pure function of the existing value so the caller
/// can snapshot and reapply it around an optimistic mutation.
pub struct FieldUpdater {
    pub field: FieldName,
    pub apply: Box<dyn FnOnce(Option<&FieldValue>) -> FieldUpdate>,
}

impl FieldUpdater {
    pub fn new(
        field: FieldName,
        apply: impl FnOnce(Option<&FieldValue>) -> FieldUpdate + 'static,
    ) -> Self {
        Self {
            field,
            apply: Box::new(apply),
        }
    }
}

/// Key-addressed map of normalized entities, with retained roots for
/// garbage collection and a broadcast journal for dependent-query
/// notification.
///
/// All operations take `&mut self` and run to completion; the cache is
/// single-threaded by design (completions are serialized by the host event
/// loop), so there is no internal locking.
#[derive(Default)]
pub struct EntityStore {
    pub(crate) entities: HashMap<EntityKey, Entity>,
    pub(crate) roots: HashSet<EntityKey>,
    broadcasts: BTreeSet<EntityKey>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the stable cache address of an entity.
    pub fn identify(type_name: TypeName, id: NodeId) -> EntityKey {
        EntityKey::new(type_name, id)
    }

    /// Number of entities currently stored.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether an entity exists at `key`.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// The entity at `key`, if cached.
    pub fn entity(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// All entity keys currently in the store, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entities.keys()
    }

    // ---------------------------------------------------------------
    // Fragment reads and writes
    // ---------------------------------------------------------------

    /// Read one field of an entity. `None` if the entity or field is not
    /// cached — the caller treats that as "fetch from network".
    pub fn read_field(&self, key: &EntityKey, field: &FieldName) -> Option<&FieldValue> {
        self.entities.get(key)?.field(field)
    }

    /// Read a fragment: the requested fields that are cached for `key`.
    ///
    /// `None` if the entity itself is unknown; otherwise the subset of
    /// `fields` present (which may be empty).
    pub fn read_fragment(&self, key: &EntityKey, fields: &[FieldName]) -> Option<FieldMap> {
        let entity = self.entities.get(key)?;
        Some(
            fields
                .iter()
                .filter_map(|name| {
                    entity
                        .field(name)
                        .map(|value| (name.clone(), value.clone()))
                })
                .collect(),
        )
    }

    /// Write a fragment: merge `fields` into the entity at `key`, creating
    /// it on first write.
    pub fn write_fragment(&mut self, key: EntityKey, fields: FieldMap, broadcast: Broadcast) {
        let entity = self
            .entities
            .entry(key.clone())
            .or_insert_with(|| Entity::new(key.clone()));
        entity.merge(fields);
        if broadcast == Broadcast::Notify {
            self.broadcasts.insert(key);
        }
    }

    // ---------------------------------------------------------------
    // Atomic field transforms
    // ---------------------------------------------------------------

    /// Transform one field of an existing entity.
    ///
    /// The updater sees the current value (`None` if the field is unset)
    /// and decides to keep a value or remove the entry. Returns `false`
    /// without invoking the updater if no entity exists at `key`.
    pub fn modify(
        &mut self,
        key: &EntityKey,
        field: &FieldName,
        updater: impl FnOnce(Option<&FieldValue>) -> FieldUpdate,
    ) -> bool {
        let Some(entity) = self.entities.get_mut(key) else {
            return false;
        };
        match updater(entity.field(field)) {
            FieldUpdate::Keep(value) => entity.set(field.clone(), value),
            FieldUpdate::Remove => {
                entity.unset(field);
            }
        }
        self.broadcasts.insert(key.clone());
        true
    }

    /// Apply several field updaters to one entity as a single broadcast
    /// unit. Returns the number of updaters applied (zero if the entity is
    /// not cached).
    pub fn modify_many(&mut self, key: &EntityKey, updaters: Vec<FieldUpdater>) -> usize {
        let Some(entity) = self.entities.get_mut(key) else {
            return 0;
        };
        let mut applied = 0;
        for FieldUpdater { field, apply } in updaters {
            match apply(entity.field(&field)) {
                FieldUpdate::Keep(value) => entity.set(field, value),
                FieldUpdate::Remove => {
                    entity.unset(&field);
                }
            }
            applied += 1;
        }
        if applied > 0 {
            self.broadcasts.insert(key.clone());
        }
        applied
    }

    // ---------------------------------------------------------------
    // Eviction
    // ---------------------------------------------------------------

    /// Evict a whole entity, or one field of it.
    ///
    /// Eviction of a missing key or field is a no-op returning `false`.
    pub fn evict(&mut self, key: &EntityKey, field: Option<&FieldName>) -> bool {
        let evicted = match field {
            None => self.entities.remove(key).is_some(),
            Some(name) => self
                .entities
                .get_mut(key)
                .is_some_and(|entity| entity.unset(name)),
        };
        if evicted {
            debug!(key = %key, field = field.map(FieldName::as_str), "evicted");
            self.broadcasts.insert(key.clone());
        }
        evicted
    }

    // ---------------------------------------------------------------
    // Retained roots
    // ---------------------------------------------------------------

    /// Mark `key` as a live query root: it and everything reachable from it
    /// survive garbage collection.
    pub fn retain(&mut self, key: EntityKey) {
        self.roots.insert(key);
    }

    /// Drop a retained root. Returns `true` if it was retained.
    pub fn release(&mut self, key: &EntityKey) -> bool {
        self.roots.remove(key)
    }

    /// The currently retained roots.
    pub fn roots(&self) -> impl Iterator<Item = &EntityKey> {
        self.roots.iter()
    }

    // ---------------------------------------------------------------
    // Broadcast journal
    // ---------------------------------------------------------------

    /// Take the keys whose dependent queries should recompute, in key
    /// order. Silent writes never appear here.
    pub fn drain_broadcasts(&mut self) -> Vec<EntityKey> {
        std::mem::take(&mut self.broadcasts).into_iter().collect()
    }

    pub(crate) fn mark_broadcast(&mut self, key: EntityKey) {
        self.broadcasts.insert(key);
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("entities", &self.entities.len())
            .field("roots", &self.roots.len())
            .field("pending_broadcasts", &self.broadcasts.len())
            .finish()
    }
}
