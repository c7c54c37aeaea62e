//! Computing the externally visible value of a cached list.
//!
//! Reads return `ordered ++ unordered`; the absence of a cached field (a
//! store-level `None`) is the signal to fetch from the network. The
//! children read additionally backfills missing parent back-references with
//! silent writes, so detail views can resolve "parent" without a round-trip
//! and without re-rendering unrelated consumers.

use canopy_store::{Broadcast, EntityStore};
use canopy_types::{
    BoundedList, BoundedRequest, EntityKey, FieldValue, ListEntry, ListPartition,
};

use crate::bounded::satisfies;
use crate::fields;

/// The visible value of a plain cached list.
pub fn read_list(partition: &ListPartition) -> Vec<ListEntry> {
    partition.visible()
}

/// The visible value of a folder's child list, backfilling the `parent`
/// back-reference of any child that lacks one.
///
/// The backfill writes are silent: they denormalize data the reader already
/// has, and broadcasting them would recompute every dependent query for no
/// observable change.
pub fn read_children(
    store: &mut EntityStore,
    parent: &EntityKey,
    partition: &ListPartition,
) -> Vec<ListEntry> {
    let parent_field = fields::parent();
    let missing: Vec<EntityKey> = partition
        .keys()
        .filter(|child| store.read_field(child, &parent_field).is_none())
        .cloned()
        .collect();
    for child in missing {
        store.write_fragment(
            child,
            FieldValue::map([(parent_field.clone(), FieldValue::Reference(parent.clone()))]),
            Broadcast::Silent,
        );
    }
    partition.visible()
}

/// Answer a bounded-list request from cache when the cached window
/// dominates it; `None` means the caller must go to the network.
pub fn read_bounded(cached: &BoundedList, request: &BoundedRequest) -> Option<Vec<ListEntry>> {
    satisfies(cached, request).then(|| cached.items.clone())
}
