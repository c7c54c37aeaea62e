//! Reconciling an incoming server page with a cached list partition.
//!
//! The merge keeps what the server has confirmed and appends what is new,
//! exactly once:
//!
//! - An incoming item already present in `ordered` merges its fields into
//!   the entity store in place; its confirmed position never moves.
//! - Any other incoming item leaves `unordered` (if it was there) and is
//!   appended to `ordered` in arrival order — the server has now confirmed
//!   its position.
//! - Unordered entries no incoming item matched survive untouched.
//!
//! Repeated or overlapping page fetches are therefore idempotent: an id can
//! enter `ordered` only once, and `ordered`/`unordered` never share an id.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use canopy_store::{Broadcast, EntityStore};
use canopy_types::{
    EntityKey, FieldMap, FilterKey, ListEntry, ListPartition, PageCursor, SortKey,
};

/// One item of an incoming server page.
///
/// `key: None` marks an item the server returned without an identifiable
/// id. Such items are always newly placed and never deduplicated — degraded
/// but safe (they cannot corrupt the position of identified entries).
#[derive(Clone, Debug)]
pub struct IncomingItem {
    pub key: Option<EntityKey>,
    pub fields: FieldMap,
}

impl IncomingItem {
    pub fn keyed(key: EntityKey, fields: FieldMap) -> Self {
        Self {
            key: Some(key),
            fields,
        }
    }

    pub fn keyless(fields: FieldMap) -> Self {
        Self { key: None, fields }
    }
}

/// Context of the request that produced an incoming page, threaded
/// explicitly into every merge (never read from ambient state).
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeContext<'a> {
    /// The continuation cursor the request was issued with; `None` means a
    /// first page.
    pub request_cursor: Option<&'a PageCursor>,
    /// The sort order the request was issued under.
    pub active_sort: Option<&'a SortKey>,
}

impl<'a> MergeContext<'a> {
    pub fn first_page(active_sort: Option<&'a SortKey>) -> Self {
        Self {
            request_cursor: None,
            active_sort,
        }
    }

    pub fn continuation(cursor: &'a PageCursor, active_sort: Option<&'a SortKey>) -> Self {
        Self {
            request_cursor: Some(cursor),
            active_sort,
        }
    }
}

/// Merge one incoming page into a cached list partition.
///
/// Item fields normalize into `store`; the returned partition holds the
/// reconciled entry order and the new continuation cursor. `None` means the
/// page was discarded and the cached state (whatever the caller holds)
/// still stands — the caller must not write anything back.
///
/// Two guard rails run before the merge proper:
///
/// 1. A cached partition recorded under a different sort than the request's
///    is stale: a first page drops it wholesale and merges into an empty
///    partition (never partially merged across sort orders). A continuation
///    belongs to a pagination whose head pages are not cached under the
///    request's sort, so its tail cannot anchor: the page is discarded.
/// 2. A continuation request whose cursor no longer matches the cached
///    partition's cursor was superseded by a concurrent write to the same
///    list (including eviction of the whole list); its page is discarded.
///    First pages always merge.
pub fn merge_page(
    store: &mut EntityStore,
    existing: Option<ListPartition>,
    incoming: Vec<IncomingItem>,
    incoming_cursor: Option<PageCursor>,
    ctx: &MergeContext<'_>,
) -> Option<ListPartition> {
    let mut base = existing.unwrap_or_default();

    if base.sort.as_ref() != ctx.active_sort {
        if ctx.request_cursor.is_some() {
            debug!(
                cached = base.sort.as_ref().map(SortKey::as_str),
                active = ctx.active_sort.map(SortKey::as_str),
                "continuation under a different sort, page discarded"
            );
            return None;
        }
        if !base.is_empty() || base.sort.is_some() {
            debug!(
                cached = base.sort.as_ref().map(SortKey::as_str),
                active = ctx.active_sort.map(SortKey::as_str),
                "sort changed, dropping cached list"
            );
        }
        base = ListPartition::with_sort(ctx.active_sort.cloned());
    } else if let Some(requested) = ctx.request_cursor {
        if base.cursor.as_ref() != Some(requested) {
            debug!(
                requested = %requested,
                cached = base.cursor.as_ref().map(PageCursor::as_str),
                "continuation superseded, page discarded"
            );
            return None;
        }
    }

    let ordered_keys: HashSet<EntityKey> = base
        .ordered
        .iter()
        .filter_map(|entry| entry.key().cloned())
        .collect();
    let mut placed_keys: HashSet<EntityKey> = HashSet::new();
    let mut newly_placed: Vec<ListEntry> = Vec::new();

    for item in incoming {
        match item.key {
            None => newly_placed.push(ListEntry::Inline(item.fields)),
            Some(key) => {
                store.write_fragment(key.clone(), item.fields, Broadcast::Notify);
                if ordered_keys.contains(&key) || placed_keys.contains(&key) {
                    // Confirmed position unchanged; fields merged in place.
                    continue;
                }
                if let Some(i) = base.unordered.iter().position(|e| e.is(&key)) {
                    base.unordered.remove(i);
                }
                placed_keys.insert(key.clone());
                newly_placed.push(ListEntry::Keyed(key));
            }
        }
    }

    base.ordered.extend(newly_placed);
    base.cursor = incoming_cursor;
    Some(base)
}

/// Merge one incoming page of a filtered list (e.g. search results) into
/// its per-filter-argument slot.
///
/// A first page for a filter key resets that slot before merging, so a new
/// invocation of the same filter shape never mixes with stale results. A
/// discarded page leaves the slot exactly as it was — in particular, an
/// orphan continuation for a slot that was evicted must not materialize an
/// empty, complete-looking slot. Other slots in the family are never
/// touched.
///
/// Returns `true` when the family was modified, so the caller knows
/// whether a write-back is warranted.
pub fn merge_filtered(
    store: &mut EntityStore,
    family: &mut BTreeMap<FilterKey, ListPartition>,
    filter: FilterKey,
    incoming: Vec<IncomingItem>,
    incoming_cursor: Option<PageCursor>,
    ctx: &MergeContext<'_>,
) -> bool {
    let existing = if ctx.request_cursor.is_none() {
        if family.remove(&filter).is_some() {
            debug!(filter = %filter, "first page, resetting filtered slot");
        }
        None
    } else {
        family.get(&filter).cloned()
    };

    match merge_page(store, existing, incoming, incoming_cursor, ctx) {
        Some(merged) => {
            family.insert(filter, merged);
            true
        }
        None => false,
    }
}
