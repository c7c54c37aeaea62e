//! Well-known field names of the drive graph.

use canopy_types::FieldName;

/// Back-reference from a node to its parent folder; written lazily by the
/// children read policy.
pub fn parent() -> FieldName {
    FieldName::new("parent")
}

/// A folder's paginated child list.
pub fn children() -> FieldName {
    FieldName::new("children")
}

/// A node's bounded share-member list.
pub fn members() -> FieldName {
    FieldName::new("members")
}

/// A query root's filtered search results.
pub fn search() -> FieldName {
    FieldName::new("search")
}
