use serde::{Deserialize, Serialize};

use canopy_types::{EntityKey, FieldMap, FieldName, FieldValue};

/// One normalized entity: its cache address plus its merged fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    key: EntityKey,
    fields: FieldMap,
}

impl Entity {
    /// Create an entity with no fields yet.
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            fields: FieldMap::new(),
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, name: &FieldName) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns `true` if the entity has no cached fields left.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge `incoming` into this entity field-by-field (last write wins
    /// per field; untouched fields survive).
    pub(crate) fn merge(&mut self, incoming: FieldMap) {
        for (name, value) in incoming {
            self.fields.insert(name, value);
        }
    }

    pub(crate) fn set(&mut self, name: FieldName, value: FieldValue) {
        self.fields.insert(name, value);
    }

    pub(crate) fn unset(&mut self, name: &FieldName) -> bool {
        self.fields.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_types::{NodeId, TypeName};

    fn key(id: &str) -> EntityKey {
        EntityKey::new(TypeName::new("Node"), NodeId::new(id).unwrap())
    }

    #[test]
    fn merge_is_field_by_field() {
        let mut entity = Entity::new(key("a"));
        entity.merge(FieldValue::map([
            (FieldName::new("name"), FieldValue::scalar("draft.txt")),
            (FieldName::new("size"), FieldValue::scalar(10)),
        ]));
        // A later fragment touching only `name` must leave `size` alone.
        entity.merge(FieldValue::map([(
            FieldName::new("name"),
            FieldValue::scalar("final.txt"),
        )]));

        assert_eq!(
            entity.field(&FieldName::new("name")),
            Some(&FieldValue::scalar("final.txt"))
        );
        assert_eq!(
            entity.field(&FieldName::new("size")),
            Some(&FieldValue::scalar(10))
        );
    }

    #[test]
    fn unset_reports_presence() {
        let mut entity = Entity::new(key("a"));
        entity.set(FieldName::new("name"), FieldValue::scalar("x"));
        assert!(entity.unset(&FieldName::new("name")));
        assert!(!entity.unset(&FieldName::new("name")));
        assert!(entity.is_empty());
    }
}
