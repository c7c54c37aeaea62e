//! The drive schema: type names and the default policy table.

use canopy_lists::{fields, FieldPolicy, MergeStrategy, PolicyRegistry, ReadStrategy};
use canopy_types::TypeName;

/// Files and folders — the nodes of the drive tree.
pub fn node() -> TypeName {
    TypeName::new("Node")
}

/// A member of a node's share.
pub fn member() -> TypeName {
    TypeName::new("Member")
}

/// The query root entity that anchors top-level lists (search results).
pub fn query() -> TypeName {
    TypeName::new("Query")
}

/// The default policy table for the drive graph:
///
/// - `Node.children` — accumulated pages, lazy parent backfill on read.
/// - `Query.search` — per-filter-argument slots, first page resets.
/// - `Node.members` — bounded `(cursor, limit)` window with dominance.
pub fn default_registry() -> PolicyRegistry {
    PolicyRegistry::new()
        .register(
            node(),
            fields::children(),
            FieldPolicy::new(MergeStrategy::Paginated, ReadStrategy::ChildrenBackfill),
        )
        .register(
            query(),
            fields::search(),
            FieldPolicy::new(MergeStrategy::Filtered, ReadStrategy::Concatenate),
        )
        .register(
            node(),
            fields::members(),
            FieldPolicy::new(MergeStrategy::Bounded, ReadStrategy::Bounded),
        )
}
