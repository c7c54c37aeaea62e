//! Reachability-based garbage collection.
//!
//! The sweep starts from the retained roots and follows every reference a
//! field value can hold: entity references, keyed list entries in both
//! partitions, every partition of a filtered-list family, bounded-list
//! items, and references inside inline field maps. Entities reached by none
//! of them are dropped.
//!
//! No background timer exists: the mutation layer invokes [`EntityStore::gc`]
//! explicitly after evictions and deletes, and the sweep runs synchronously.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use canopy_types::{EntityKey, FieldMap, FieldValue, ListEntry, ListPartition};

use crate::store::EntityStore;

impl EntityStore {
    /// Drop every entity unreachable from the retained roots, returning
    /// the removed keys in key order.
    pub fn gc(&mut self) -> Vec<EntityKey> {
        let mut reachable: HashSet<EntityKey> = HashSet::new();
        let mut queue: VecDeque<EntityKey> = self.roots.iter().cloned().collect();

        while let Some(key) = queue.pop_front() {
            if !reachable.insert(key.clone()) {
                continue;
            }
            let Some(entity) = self.entities.get(&key) else {
                // A root may point at an entity evicted earlier; it simply
                // anchors nothing.
                continue;
            };
            collect_field_refs(entity.fields(), &mut queue);
        }

        let mut removed: Vec<EntityKey> = self
            .entities
            .keys()
            .filter(|key| !reachable.contains(*key))
            .cloned()
            .collect();
        removed.sort();
        for key in &removed {
            self.entities.remove(key);
        }
        if !removed.is_empty() {
            debug!(removed = removed.len(), kept = self.entities.len(), "gc sweep");
        }
        removed
    }
}

fn collect_field_refs(fields: &FieldMap, queue: &mut VecDeque<EntityKey>) {
    for value in fields.values() {
        collect_value_refs(value, queue);
    }
}

fn collect_value_refs(value: &FieldValue, queue: &mut VecDeque<EntityKey>) {
    match value {
        FieldValue::Scalar(_) => {}
        FieldValue::Reference(key) => queue.push_back(key.clone()),
        FieldValue::List(partition) => collect_partition_refs(partition, queue),
        FieldValue::FilteredList(map) => {
            for partition in map.values() {
                collect_partition_refs(partition, queue);
            }
        }
        FieldValue::Bounded(bounded) => {
            for entry in &bounded.items {
                collect_entry_refs(entry, queue);
            }
        }
    }
}

fn collect_partition_refs(partition: &ListPartition, queue: &mut VecDeque<EntityKey>) {
    for entry in partition.iter() {
        collect_entry_refs(entry, queue);
    }
}

fn collect_entry_refs(entry: &ListEntry, queue: &mut VecDeque<EntityKey>) {
    match entry {
        ListEntry::Keyed(key) => queue.push_back(key.clone()),
        ListEntry::Inline(fields) => collect_field_refs(fields, queue),
    }
}
