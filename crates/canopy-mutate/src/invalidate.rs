//! Wholesale invalidation after structural or permission changes.
//!
//! When a move, trash, restore, or delete lands somewhere other than the
//! currently open list, merging the change incrementally is not worth the
//! risk of a wrong shape: the affected parents' child lists are evicted
//! outright and refetched clean on next read. Permission-affecting edits
//! cascade further: every cached descendant's share list may now be wrong,
//! so all of them are evicted.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use canopy_lists::fields;
use canopy_store::EntityStore;
use canopy_types::{EntityKey, FieldValue};

/// Evict the `children` field of each given parent. Returns how many
/// fields were actually evicted (missing ones are no-ops).
pub fn evict_children(store: &mut EntityStore, parents: &[EntityKey]) -> usize {
    let field = fields::children();
    let evicted = parents
        .iter()
        .filter(|parent| store.evict(parent, Some(&field)))
        .count();
    if evicted > 0 {
        debug!(evicted, "evicted child lists after structural change");
    }
    evicted
}

/// Evict the share-member list of `root` and of every cached transitive
/// descendant.
///
/// The walk follows cached `children` partitions only — descendants the
/// cache has never seen have nothing to evict, so nothing is fetched to
/// extend the walk. Returns how many member lists were evicted.
pub fn evict_share_lists(store: &mut EntityStore, root: &EntityKey) -> usize {
    let children_field = fields::children();
    let members_field = fields::members();

    let mut visited: HashSet<EntityKey> = HashSet::new();
    let mut queue: VecDeque<EntityKey> = VecDeque::from([root.clone()]);
    let mut evicted = 0;

    while let Some(node) = queue.pop_front() {
        if !visited.insert(node.clone()) {
            continue;
        }
        if let Some(FieldValue::List(partition)) = store.read_field(&node, &children_field) {
            queue.extend(partition.keys().cloned());
        }
        if store.evict(&node, Some(&members_field)) {
            evicted += 1;
        }
    }

    if evicted > 0 {
        debug!(root = %root, evicted, "cascaded share-list eviction");
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_store::Broadcast;
    use canopy_types::{
        BoundedList, FieldMap, ListEntry, ListPartition, NodeId, TypeName,
    };

    fn key(id: &str) -> EntityKey {
        EntityKey::new(TypeName::new("Node"), NodeId::new(id).unwrap())
    }

    fn with_children(store: &mut EntityStore, id: &str, child_ids: &[&str]) {
        store.write_fragment(
            key(id),
            FieldValue::map([(
                fields::children(),
                FieldValue::List(ListPartition {
                    ordered: child_ids.iter().map(|c| ListEntry::Keyed(key(c))).collect(),
                    ..ListPartition::default()
                }),
            )]),
            Broadcast::Silent,
        );
    }

    fn with_members(store: &mut EntityStore, id: &str) {
        store.write_fragment(
            key(id),
            FieldValue::map([(
                fields::members(),
                FieldValue::Bounded(BoundedList {
                    items: vec![ListEntry::Keyed(key("someone"))],
                    cursor: None,
                    limit: 10,
                }),
            )]),
            Broadcast::Silent,
        );
    }

    #[test]
    fn evict_children_hits_only_cached_fields() {
        let mut store = EntityStore::new();
        with_children(&mut store, "p1", &["a"]);
        store.write_fragment(key("p2"), FieldMap::new(), Broadcast::Silent);

        let evicted = evict_children(&mut store, &[key("p1"), key("p2"), key("ghost")]);
        assert_eq!(evicted, 1);
        assert!(store
            .read_field(&key("p1"), &fields::children())
            .is_none());
    }

    #[test]
    fn share_eviction_cascades_through_cached_descendants() {
        let mut store = EntityStore::new();
        with_children(&mut store, "root", &["mid"]);
        with_children(&mut store, "mid", &["leaf"]);
        with_members(&mut store, "root");
        with_members(&mut store, "mid");
        with_members(&mut store, "leaf");
        // A node outside the subtree must keep its member list.
        with_members(&mut store, "elsewhere");

        let evicted = evict_share_lists(&mut store, &key("root"));
        assert_eq!(evicted, 3);
        assert!(store
            .read_field(&key("leaf"), &fields::members())
            .is_none());
        assert!(store
            .read_field(&key("elsewhere"), &fields::members())
            .is_some());
    }

    #[test]
    fn walk_stops_at_uncached_nodes() {
        let mut store = EntityStore::new();
        // "root" lists a child the cache has no entity for.
        with_children(&mut store, "root", &["unknown"]);
        with_members(&mut store, "root");

        let evicted = evict_share_lists(&mut store, &key("root"));
        assert_eq!(evicted, 1);
    }

    #[test]
    fn cyclic_child_references_terminate() {
        let mut store = EntityStore::new();
        with_children(&mut store, "a", &["b"]);
        with_children(&mut store, "b", &["a"]);
        with_members(&mut store, "a");
        with_members(&mut store, "b");

        assert_eq!(evict_share_lists(&mut store, &key("a")), 2);
    }
}
