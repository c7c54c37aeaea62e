//! Removing ids from every cached list that should see the removal.
//!
//! A mutation that trashes or moves nodes does not know every list those
//! nodes appear in — folder children, search slots, bounded member lists.
//! [`remove_ids`] sweeps all of them, letting a caller-supplied predicate
//! skip the views a given mutation cannot have affected.
//!
//! Emptiness rule: a list emptied while it still carries a continuation
//! cursor is evicted wholesale. An empty partial list cannot be rendered as
//! "nothing here" — more items might exist on unfetched pages — so the next
//! read must miss and refetch. A fully-loaded list that empties stays
//! cached as an explicit empty list.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use canopy_store::{EntityStore, FieldUpdate};
use canopy_types::{
    BoundedList, EntityKey, FieldName, FieldValue, FilterKey, ListPartition, SortKey,
};

/// What a removal predicate sees about one cached list before deciding
/// whether the removal applies to it.
#[derive(Clone, Copy, Debug)]
pub struct ListMetadata<'a> {
    /// The entity holding the list field.
    pub entity: &'a EntityKey,
    /// The list field's name.
    pub field: &'a FieldName,
    /// The filter-argument key, for slots of a filtered family.
    pub filter: Option<&'a FilterKey>,
    /// The sort order the list was fetched under.
    pub sort: Option<&'a SortKey>,
    /// Whether the list is only partially loaded.
    pub partial: bool,
}

/// Outcome of one removal sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemovalStats {
    /// List entries dropped across all lists.
    pub entries_removed: usize,
    /// Lists (or filtered slots) evicted under the emptiness rule.
    pub lists_evicted: usize,
}

enum Action {
    Replace(FieldValue),
    EvictField,
}

/// Drop `ids` from every cached list whose metadata satisfies `predicate`.
///
/// Lists the predicate rejects, and lists containing none of the ids, are
/// left untouched (no broadcast). Touched lists broadcast through the
/// store's journal as usual.
pub fn remove_ids(
    store: &mut EntityStore,
    ids: &[EntityKey],
    mut predicate: impl FnMut(&ListMetadata<'_>) -> bool,
) -> RemovalStats {
    let ids: HashSet<&EntityKey> = ids.iter().collect();
    let mut stats = RemovalStats::default();
    let mut actions: Vec<(EntityKey, FieldName, Action)> = Vec::new();

    let entity_keys: Vec<EntityKey> = store.keys().cloned().collect();
    for entity_key in entity_keys {
        let Some(entity) = store.entity(&entity_key) else {
            continue;
        };
        for (field_name, value) in entity.fields() {
            let action = match value {
                FieldValue::List(partition) => {
                    plan_partition(&entity_key, field_name, None, partition, &ids, &mut predicate)
                        .map(|(p, removed)| {
                            stats.entries_removed += removed;
                            finish_partition(p, &mut stats)
                        })
                }
                FieldValue::FilteredList(family) => plan_filtered(
                    &entity_key,
                    field_name,
                    family,
                    &ids,
                    &mut predicate,
                    &mut stats,
                ),
                FieldValue::Bounded(bounded) => {
                    plan_bounded(&entity_key, field_name, bounded, &ids, &mut predicate).map(
                        |(b, removed)| {
                            stats.entries_removed += removed;
                            finish_bounded(b, &mut stats)
                        },
                    )
                }
                FieldValue::Scalar(_) | FieldValue::Reference(_) => None,
            };
            if let Some(action) = action {
                actions.push((entity_key.clone(), field_name.clone(), action));
            }
        }
    }

    for (entity_key, field_name, action) in actions {
        match action {
            Action::Replace(value) => {
                store.modify(&entity_key, &field_name, |_| FieldUpdate::Keep(value));
            }
            Action::EvictField => {
                store.evict(&entity_key, Some(&field_name));
            }
        }
    }

    if stats != RemovalStats::default() {
        debug!(
            removed = stats.entries_removed,
            evicted = stats.lists_evicted,
            "removal sweep"
        );
    }
    stats
}

/// Filtered copy of a partition, or `None` when the predicate rejects it
/// or nothing would change.
fn plan_partition(
    entity: &EntityKey,
    field: &FieldName,
    filter: Option<&FilterKey>,
    partition: &ListPartition,
    ids: &HashSet<&EntityKey>,
    predicate: &mut impl FnMut(&ListMetadata<'_>) -> bool,
) -> Option<(ListPartition, usize)> {
    let meta = ListMetadata {
        entity,
        field,
        filter,
        sort: partition.sort.as_ref(),
        partial: !partition.is_fully_loaded(),
    };
    if !predicate(&meta) {
        return None;
    }
    let mut filtered = partition.clone();
    filtered
        .ordered
        .retain(|entry| !entry.key().is_some_and(|key| ids.contains(key)));
    filtered
        .unordered
        .retain(|entry| !entry.key().is_some_and(|key| ids.contains(key)));
    let removed = partition.len() - filtered.len();
    (removed > 0).then_some((filtered, removed))
}

fn finish_partition(partition: ListPartition, stats: &mut RemovalStats) -> Action {
    if partition.is_empty() && !partition.is_fully_loaded() {
        stats.lists_evicted += 1;
        Action::EvictField
    } else {
        Action::Replace(FieldValue::List(partition))
    }
}

fn plan_filtered(
    entity: &EntityKey,
    field: &FieldName,
    family: &BTreeMap<FilterKey, ListPartition>,
    ids: &HashSet<&EntityKey>,
    predicate: &mut impl FnMut(&ListMetadata<'_>) -> bool,
    stats: &mut RemovalStats,
) -> Option<Action> {
    let mut changed = false;
    let mut new_family: BTreeMap<FilterKey, ListPartition> = BTreeMap::new();
    for (filter, partition) in family {
        match plan_partition(entity, field, Some(filter), partition, ids, predicate) {
            None => {
                new_family.insert(filter.clone(), partition.clone());
            }
            Some((filtered, removed)) => {
                changed = true;
                stats.entries_removed += removed;
                if filtered.is_empty() && !filtered.is_fully_loaded() {
                    // Emptiness rule per slot: the slot vanishes.
                    stats.lists_evicted += 1;
                } else {
                    new_family.insert(filter.clone(), filtered);
                }
            }
        }
    }
    if !changed {
        return None;
    }
    if new_family.is_empty() {
        Some(Action::EvictField)
    } else {
        Some(Action::Replace(FieldValue::FilteredList(new_family)))
    }
}

fn plan_bounded(
    entity: &EntityKey,
    field: &FieldName,
    bounded: &BoundedList,
    ids: &HashSet<&EntityKey>,
    predicate: &mut impl FnMut(&ListMetadata<'_>) -> bool,
) -> Option<(BoundedList, usize)> {
    let meta = ListMetadata {
        entity,
        field,
        filter: None,
        sort: None,
        partial: bounded.cursor.is_some(),
    };
    if !predicate(&meta) {
        return None;
    }
    let mut filtered = bounded.clone();
    filtered
        .items
        .retain(|entry| !entry.key().is_some_and(|key| ids.contains(key)));
    let removed = bounded.items.len() - filtered.items.len();
    (removed > 0).then_some((filtered, removed))
}

fn finish_bounded(bounded: BoundedList, stats: &mut RemovalStats) -> Action {
    if bounded.items.is_empty() && bounded.cursor.is_some() {
        stats.lists_evicted += 1;
        Action::EvictField
    } else {
        Action::Replace(FieldValue::Bounded(bounded))
    }
}
