//! The per-field policy registry.
//!
//! Which merge and read behavior applies to a list field is a static
//! property of the schema, so it is resolved once, at cache construction,
//! from a `(TypeName, FieldName)` table — never dispatched dynamically by
//! string-keyed callbacks at merge time.

use std::collections::HashMap;

use canopy_types::{FieldName, TypeName};

/// How incoming pages merge into the cached shape of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// One accumulated partition per field (folder children).
    Paginated,
    /// One partition per filter-argument set, first page resets its slot
    /// (search results).
    Filtered,
    /// A `(cursor, limit)` window with dominance checks (share members).
    Bounded,
}

/// How the externally visible value of a field is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStrategy {
    /// `ordered ++ unordered`, nothing else.
    Concatenate,
    /// `ordered ++ unordered`, plus the lazy parent backfill.
    ChildrenBackfill,
    /// Answer from cache when the cached window dominates the request.
    Bounded,
}

/// The merge/read pair applied to one list field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldPolicy {
    pub merge: MergeStrategy,
    pub read: ReadStrategy,
}

impl FieldPolicy {
    pub const fn new(merge: MergeStrategy, read: ReadStrategy) -> Self {
        Self { merge, read }
    }
}

/// Lookup table from `(TypeName, FieldName)` to the field's policy.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: HashMap<TypeName, HashMap<FieldName, FieldPolicy>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy, builder-style. Later registrations for the same
    /// `(type, field)` pair replace earlier ones.
    pub fn register(
        mut self,
        type_name: TypeName,
        field: FieldName,
        policy: FieldPolicy,
    ) -> Self {
        self.policies
            .entry(type_name)
            .or_default()
            .insert(field, policy);
        self
    }

    /// The policy for a field, if one was registered. Fields without a
    /// policy are plain scalars/references to the cache.
    pub fn resolve(&self, type_name: &TypeName, field: &FieldName) -> Option<&FieldPolicy> {
        self.policies.get(type_name)?.get(field)
    }

    pub fn len(&self) -> usize {
        self.policies.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_finds_registered_pairs_only() {
        let registry = PolicyRegistry::new().register(
            TypeName::new("Folder"),
            FieldName::new("children"),
            FieldPolicy::new(MergeStrategy::Paginated, ReadStrategy::ChildrenBackfill),
        );

        let hit = registry.resolve(&TypeName::new("Folder"), &FieldName::new("children"));
        assert_eq!(
            hit,
            Some(&FieldPolicy::new(
                MergeStrategy::Paginated,
                ReadStrategy::ChildrenBackfill
            ))
        );
        assert!(registry
            .resolve(&TypeName::new("Folder"), &FieldName::new("name"))
            .is_none());
        assert!(registry
            .resolve(&TypeName::new("Node"), &FieldName::new("children"))
            .is_none());
    }

    #[test]
    fn later_registration_wins() {
        let registry = PolicyRegistry::new()
            .register(
                TypeName::new("Query"),
                FieldName::new("search"),
                FieldPolicy::new(MergeStrategy::Paginated, ReadStrategy::Concatenate),
            )
            .register(
                TypeName::new("Query"),
                FieldName::new("search"),
                FieldPolicy::new(MergeStrategy::Filtered, ReadStrategy::Concatenate),
            );

        assert_eq!(registry.len(), 1);
        let policy = registry
            .resolve(&TypeName::new("Query"), &FieldName::new("search"))
            .unwrap();
        assert_eq!(policy.merge, MergeStrategy::Filtered);
    }
}
