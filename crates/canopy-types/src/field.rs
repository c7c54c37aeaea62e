use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::FilterKey;
use crate::id::{EntityKey, FieldName};
use crate::list::{BoundedList, ListPartition};

/// An entity's fields: name → value, merged field-by-field on write.
pub type FieldMap = BTreeMap<FieldName, FieldValue>;

/// One cached field of an entity.
///
/// Scalars are opaque server data. References normalize links between
/// entities. The three list variants are the shapes the merge/read policies
/// operate on: a plain paginated list, a per-filter-argument family of
/// paginated lists, and a `(cursor, limit)`-bounded list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Scalar(serde_json::Value),
    Reference(EntityKey),
    List(ListPartition),
    FilteredList(BTreeMap<FilterKey, ListPartition>),
    Bounded(BoundedList),
}

impl FieldValue {
    /// Shorthand for a scalar field.
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn as_reference(&self) -> Option<&EntityKey> {
        match self {
            Self::Reference(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListPartition> {
        match self {
            Self::List(partition) => Some(partition),
            _ => None,
        }
    }

    pub fn as_filtered(&self) -> Option<&BTreeMap<FilterKey, ListPartition>> {
        match self {
            Self::FilteredList(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bounded(&self) -> Option<&BoundedList> {
        match self {
            Self::Bounded(list) => Some(list),
            _ => None,
        }
    }

    /// Build a field map from `(name, value)` pairs.
    pub fn map<const N: usize>(fields: [(FieldName, FieldValue); N]) -> FieldMap {
        fields.into_iter().collect()
    }
}
