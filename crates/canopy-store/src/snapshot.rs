//! Whole-store snapshots for optimistic-mutation rollback.
//!
//! Optimistic writes apply synchronously before server confirmation; the
//! caller is responsible for reverting them when the mutation fails. A
//! [`StoreSnapshot`] captures the entity map and retained roots so the
//! store can be restored to its pre-mutation state. The broadcast journal
//! is not captured: restoring is itself a change dependents must see.

use std::collections::HashMap;

use canopy_types::EntityKey;

use crate::entity::Entity;
use crate::store::EntityStore;

/// A point-in-time copy of the store's contents.
#[derive(Clone, Debug)]
pub struct StoreSnapshot {
    entities: HashMap<EntityKey, Entity>,
    roots: Vec<EntityKey>,
}

impl EntityStore {
    /// Capture the current entities and roots.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            entities: self.entities.clone(),
            roots: self.roots.iter().cloned().collect(),
        }
    }

    /// Restore a previously captured snapshot, broadcasting every key whose
    /// entity differs between the snapshot and the current state.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        let mut touched: Vec<EntityKey> = Vec::new();
        for (key, entity) in &snapshot.entities {
            if self.entities.get(key) != Some(entity) {
                touched.push(key.clone());
            }
        }
        for key in self.entities.keys() {
            if !snapshot.entities.contains_key(key) {
                touched.push(key.clone());
            }
        }

        self.entities = snapshot.entities;
        self.roots = snapshot.roots.into_iter().collect();
        for key in touched {
            self.mark_broadcast(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_types::{FieldName, FieldValue, NodeId, TypeName};

    use crate::store::Broadcast;

    fn key(id: &str) -> EntityKey {
        EntityKey::new(TypeName::new("Node"), NodeId::new(id).unwrap())
    }

    #[test]
    fn restore_reverts_optimistic_writes() {
        let mut store = EntityStore::new();
        store.write_fragment(
            key("a"),
            FieldValue::map([(FieldName::new("name"), FieldValue::scalar("before"))]),
            Broadcast::Notify,
        );
        let snapshot = store.snapshot();
        store.drain_broadcasts();

        // Optimistic mutation that the server then rejects.
        store.write_fragment(
            key("a"),
            FieldValue::map([(FieldName::new("name"), FieldValue::scalar("after"))]),
            Broadcast::Notify,
        );
        store.write_fragment(
            key("b"),
            FieldValue::map([(FieldName::new("name"), FieldValue::scalar("new"))]),
            Broadcast::Notify,
        );
        store.drain_broadcasts();

        store.restore(snapshot);
        assert_eq!(
            store.read_field(&key("a"), &FieldName::new("name")),
            Some(&FieldValue::scalar("before"))
        );
        assert!(!store.contains(&key("b")));

        // Both reverted keys are re-broadcast.
        let broadcasts = store.drain_broadcasts();
        assert!(broadcasts.contains(&key("a")));
        assert!(broadcasts.contains(&key("b")));
    }

    #[test]
    fn restore_of_identical_state_broadcasts_nothing() {
        let mut store = EntityStore::new();
        store.write_fragment(key("a"), Default::default(), Broadcast::Silent);
        let snapshot = store.snapshot();
        store.restore(snapshot);
        assert!(store.drain_broadcasts().is_empty());
    }
}
