//! The cache facade.

use std::collections::BTreeMap;

use tracing::debug;

use canopy_lists::{
    merge_bounded, merge_filtered, merge_page, read_bounded, read_children, read_list,
    FieldPolicy, IncomingItem, MergeContext, MergeStrategy, PolicyRegistry, ReadStrategy,
};
use canopy_mutate::{
    evict_children, evict_share_lists, insert_at, remove_ids, sorted_index, InsertOutcome,
    ListMetadata, RemovalStats,
};
use canopy_store::{Broadcast, EntityStore, FieldUpdate, FieldUpdater, StoreSnapshot};
use canopy_types::{
    BoundedRequest, EntityKey, FieldMap, FieldName, FieldValue, FilterKey, ListEntry,
    ListPartition, NodeId, PageCursor, SortKey, TypeName,
};

use crate::error::{CacheError, CacheResult};
use crate::schema;

/// The shape of the request a list operation was issued with: continuation
/// cursor, active sort, filter arguments, and limit. Only the parts a
/// field's policy needs are consulted.
#[derive(Clone, Debug, Default)]
pub struct ListRequest {
    pub cursor: Option<PageCursor>,
    pub sort: Option<SortKey>,
    pub filter: Option<serde_json::Value>,
    pub limit: Option<usize>,
}

/// One page as returned by the server: the items and the continuation
/// cursor after them (`None` = no more pages).
#[derive(Clone, Debug, Default)]
pub struct PageResult {
    pub items: Vec<IncomingItem>,
    pub next: Option<PageCursor>,
}

/// The Canopy cache: a normalized entity store plus the per-field policy
/// table, behind one synchronous surface.
pub struct Cache {
    store: EntityStore,
    registry: PolicyRegistry,
}

impl Cache {
    /// A cache with the default drive policy table ([`schema::default_registry`]).
    pub fn new() -> Self {
        Self::with_registry(schema::default_registry())
    }

    /// A cache with a caller-supplied policy table.
    pub fn with_registry(registry: PolicyRegistry) -> Self {
        Self {
            store: EntityStore::new(),
            registry,
        }
    }

    /// Compute the stable cache address of an entity.
    pub fn identify(type_name: TypeName, id: NodeId) -> EntityKey {
        EntityStore::identify(type_name, id)
    }

    /// Read-only view of the underlying store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    // ---------------------------------------------------------------
    // Fragment operations (thin delegation)
    // ---------------------------------------------------------------

    pub fn read_field(&self, key: &EntityKey, field: &FieldName) -> Option<&FieldValue> {
        self.store.read_field(key, field)
    }

    pub fn read_fragment(&self, key: &EntityKey, fields: &[FieldName]) -> Option<FieldMap> {
        self.store.read_fragment(key, fields)
    }

    pub fn write_fragment(&mut self, key: EntityKey, fields: FieldMap, broadcast: Broadcast) {
        self.store.write_fragment(key, fields, broadcast);
    }

    pub fn modify(
        &mut self,
        key: &EntityKey,
        field: &FieldName,
        updater: impl FnOnce(Option<&FieldValue>) -> FieldUpdate,
    ) -> bool {
        self.store.modify(key, field, updater)
    }

    pub fn modify_many(&mut self, key: &EntityKey, updaters: Vec<FieldUpdater>) -> usize {
        self.store.modify_many(key, updaters)
    }

    pub fn evict(&mut self, key: &EntityKey, field: Option<&FieldName>) -> bool {
        self.store.evict(key, field)
    }

    pub fn retain(&mut self, key: EntityKey) {
        self.store.retain(key);
    }

    pub fn release(&mut self, key: &EntityKey) -> bool {
        self.store.release(key)
    }

    pub fn gc(&mut self) -> Vec<EntityKey> {
        self.store.gc()
    }

    pub fn drain_broadcasts(&mut self) -> Vec<EntityKey> {
        self.store.drain_broadcasts()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.store.restore(snapshot);
    }

    // ---------------------------------------------------------------
    // Policy-dispatched list operations
    // ---------------------------------------------------------------

    fn policy(&self, entity: &EntityKey, field: &FieldName) -> CacheResult<FieldPolicy> {
        self.registry
            .resolve(&entity.type_name, field)
            .copied()
            .ok_or_else(|| CacheError::NoPolicy {
                type_name: entity.type_name.clone(),
                field: field.clone(),
            })
    }

    /// Merge one server page into the list field at `entity.field`,
    /// dispatching on the field's registered merge strategy.
    pub fn merge_list_field(
        &mut self,
        entity: &EntityKey,
        field: &FieldName,
        request: &ListRequest,
        page: PageResult,
    ) -> CacheResult<()> {
        let policy = self.policy(entity, field)?;
        let ctx = MergeContext {
            request_cursor: request.cursor.as_ref(),
            active_sort: request.sort.as_ref(),
        };

        match policy.merge {
            MergeStrategy::Paginated => {
                let existing = match self.store.read_field(entity, field) {
                    None => None,
                    Some(FieldValue::List(partition)) => Some(partition.clone()),
                    Some(_) => return Err(self.shape_mismatch(entity, field)),
                };
                // A discarded page (superseded or orphaned continuation)
                // leaves the cached field exactly as it was — absent fields
                // stay absent rather than becoming empty complete lists.
                if let Some(merged) =
                    merge_page(&mut self.store, existing, page.items, page.next, &ctx)
                {
                    self.write_list_value(entity, field, FieldValue::List(merged));
                }
            }
            MergeStrategy::Filtered => {
                let args = request
                    .filter
                    .as_ref()
                    .ok_or_else(|| CacheError::MissingFilterArgs {
                        field: field.clone(),
                    })?;
                let filter = FilterKey::from_args(args);
                let mut family = match self.store.read_field(entity, field) {
                    None => BTreeMap::new(),
                    Some(FieldValue::FilteredList(family)) => family.clone(),
                    Some(_) => return Err(self.shape_mismatch(entity, field)),
                };
                let changed = merge_filtered(
                    &mut self.store,
                    &mut family,
                    filter,
                    page.items,
                    page.next,
                    &ctx,
                );
                // An orphan continuation must not materialize the field.
                if changed {
                    self.write_list_value(entity, field, FieldValue::FilteredList(family));
                }
            }
            MergeStrategy::Bounded => {
                let limit = request.limit.ok_or_else(|| CacheError::MissingLimit {
                    field: field.clone(),
                })?;
                let bounded_request = BoundedRequest {
                    cursor: request.cursor.clone(),
                    limit,
                };
                let existing = match self.store.read_field(entity, field) {
                    None => None,
                    Some(FieldValue::Bounded(bounded)) => Some(bounded.clone()),
                    Some(_) => return Err(self.shape_mismatch(entity, field)),
                };
                let merged = merge_bounded(
                    &mut self.store,
                    existing,
                    page.items,
                    page.next,
                    &bounded_request,
                );
                self.write_list_value(entity, field, FieldValue::Bounded(merged));
            }
        }
        Ok(())
    }

    /// Compute the externally visible value of the list field at
    /// `entity.field`. `Ok(None)` means nothing usable is cached and the
    /// caller should fetch from the network.
    pub fn read_list_field(
        &mut self,
        entity: &EntityKey,
        field: &FieldName,
        request: &ListRequest,
    ) -> CacheResult<Option<Vec<ListEntry>>> {
        let policy = self.policy(entity, field)?;

        if policy.merge == MergeStrategy::Bounded {
            let limit = request.limit.ok_or_else(|| CacheError::MissingLimit {
                field: field.clone(),
            })?;
            let bounded_request = BoundedRequest {
                cursor: request.cursor.clone(),
                limit,
            };
            return match self.store.read_field(entity, field) {
                None => Ok(None),
                Some(FieldValue::Bounded(bounded)) => {
                    Ok(read_bounded(bounded, &bounded_request))
                }
                Some(_) => Err(self.shape_mismatch(entity, field)),
            };
        }

        let Some(partition) = self.locate_partition(entity, field, policy, request)? else {
            return Ok(None);
        };

        // A cached list recorded under a different sort than the request's
        // is stale; report a miss so the caller refetches.
        if partition.sort.as_ref() != request.sort.as_ref() {
            debug!(entity = %entity, field = %field, "cached sort is stale, reporting miss");
            return Ok(None);
        }

        let entries = match policy.read {
            ReadStrategy::ChildrenBackfill => read_children(&mut self.store, entity, &partition),
            ReadStrategy::Concatenate | ReadStrategy::Bounded => read_list(&partition),
        };
        Ok(Some(entries))
    }

    /// Insert `key` into the list field at `entity.field` at the desired
    /// visible index (see [`canopy_mutate::insert_at`]). `Ok(None)` means
    /// the list is not cached or the item could not be placed.
    pub fn insert_into_list(
        &mut self,
        entity: &EntityKey,
        field: &FieldName,
        request: &ListRequest,
        key: EntityKey,
        desired_index: Option<usize>,
        allow_unordered_fallback: bool,
    ) -> CacheResult<Option<InsertOutcome>> {
        let policy = self.policy(entity, field)?;
        let Some(mut partition) = self.locate_partition(entity, field, policy, request)? else {
            return Ok(None);
        };

        let outcome = insert_at(&mut partition, key, desired_index, allow_unordered_fallback);
        if outcome.is_some() {
            self.store_partition(entity, field, policy, request, partition)?;
        }
        Ok(outcome)
    }

    /// The desired insert index for an item, computed against the loaded
    /// ordered entries with a comparator replicating the server's sort.
    pub fn sorted_index(
        &self,
        entity: &EntityKey,
        field: &FieldName,
        request: &ListRequest,
        sorts_after: impl FnMut(&EntityKey) -> bool,
    ) -> CacheResult<Option<usize>> {
        let policy = self.policy(entity, field)?;
        let Some(partition) = self.locate_partition(entity, field, policy, request)? else {
            return Ok(None);
        };
        Ok(sorted_index(&partition, sorts_after))
    }

    /// Drop `ids` from every cached list whose metadata satisfies
    /// `predicate` (see [`canopy_mutate::remove_ids`]).
    pub fn remove_ids(
        &mut self,
        ids: &[EntityKey],
        predicate: impl FnMut(&ListMetadata<'_>) -> bool,
    ) -> RemovalStats {
        remove_ids(&mut self.store, ids, predicate)
    }

    /// Evict the child lists of the given parents after a structural
    /// change (move, trash, restore, delete) outside the open list.
    pub fn evict_children(&mut self, parents: &[EntityKey]) -> usize {
        evict_children(&mut self.store, parents)
    }

    /// Evict the share lists of `root` and every cached descendant after a
    /// permission-affecting mutation.
    pub fn evict_share_lists(&mut self, root: &EntityKey) -> usize {
        evict_share_lists(&mut self.store, root)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Clone out the partition a request addresses: the plain list for
    /// paginated fields, the filter-argument slot for filtered ones.
    fn locate_partition(
        &self,
        entity: &EntityKey,
        field: &FieldName,
        policy: FieldPolicy,
        request: &ListRequest,
    ) -> CacheResult<Option<ListPartition>> {
        match policy.merge {
            MergeStrategy::Paginated => match self.store.read_field(entity, field) {
                None => Ok(None),
                Some(FieldValue::List(partition)) => Ok(Some(partition.clone())),
                Some(_) => Err(self.shape_mismatch(entity, field)),
            },
            MergeStrategy::Filtered => {
                let args = request
                    .filter
                    .as_ref()
                    .ok_or_else(|| CacheError::MissingFilterArgs {
                        field: field.clone(),
                    })?;
                let filter = FilterKey::from_args(args);
                match self.store.read_field(entity, field) {
                    None => Ok(None),
                    Some(FieldValue::FilteredList(family)) => {
                        Ok(family.get(&filter).cloned())
                    }
                    Some(_) => Err(self.shape_mismatch(entity, field)),
                }
            }
            MergeStrategy::Bounded => Err(self.shape_mismatch(entity, field)),
        }
    }

    /// Write a partition back to where [`locate_partition`] found it.
    ///
    /// [`locate_partition`]: Cache::locate_partition
    fn store_partition(
        &mut self,
        entity: &EntityKey,
        field: &FieldName,
        policy: FieldPolicy,
        request: &ListRequest,
        partition: ListPartition,
    ) -> CacheResult<()> {
        match policy.merge {
            MergeStrategy::Paginated => {
                self.write_list_value(entity, field, FieldValue::List(partition));
                Ok(())
            }
            MergeStrategy::Filtered => {
                let args = request
                    .filter
                    .as_ref()
                    .ok_or_else(|| CacheError::MissingFilterArgs {
                        field: field.clone(),
                    })?;
                let filter = FilterKey::from_args(args);
                let mut family = match self.store.read_field(entity, field) {
                    None => BTreeMap::new(),
                    Some(FieldValue::FilteredList(family)) => family.clone(),
                    Some(_) => return Err(self.shape_mismatch(entity, field)),
                };
                family.insert(filter, partition);
                self.write_list_value(entity, field, FieldValue::FilteredList(family));
                Ok(())
            }
            MergeStrategy::Bounded => Err(self.shape_mismatch(entity, field)),
        }
    }

    fn write_list_value(&mut self, entity: &EntityKey, field: &FieldName, value: FieldValue) {
        self.store.write_fragment(
            entity.clone(),
            FieldValue::map([(field.clone(), value)]),
            Broadcast::Notify,
        );
    }

    fn shape_mismatch(&self, entity: &EntityKey, field: &FieldName) -> CacheError {
        CacheError::ShapeMismatch {
            entity: entity.clone(),
            field: field.clone(),
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("store", &self.store)
            .field("policies", &self.registry.len())
            .finish()
    }
}
