//! The cached shape of one paginated list.
//!
//! [`ListPartition`] is the core structure of the consistency layer: every
//! cached list is split into an `ordered` partition (relative positions
//! confirmed by the server's sort order) and an `unordered` partition (items
//! known to belong to the list, position not yet confirmed). Both are
//! explicit vectors — relative order is never delegated to map iteration
//! order.
//!
//! # Invariants
//!
//! - A keyed entry appears in at most one of the two partitions.
//! - The externally visible list is `ordered ++ unordered`.
//! - `cursor: None` means fully loaded; `Some` means more pages exist.

use serde::{Deserialize, Serialize};

use crate::field::FieldMap;
use crate::filter::SortKey;
use crate::id::EntityKey;
use crate::page::PageCursor;

/// One entry of a cached list.
///
/// Items the server identified normalize into the entity store and are held
/// here by key. Items with no identifiable id are kept inline: they can
/// never be matched by a later page, so they are never deduplicated —
/// degraded but safe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ListEntry {
    Keyed(EntityKey),
    Inline(FieldMap),
}

impl ListEntry {
    /// The entity key, if this entry is identifiable.
    pub fn key(&self) -> Option<&EntityKey> {
        match self {
            Self::Keyed(key) => Some(key),
            Self::Inline(_) => None,
        }
    }

    /// Whether this entry refers to `key`.
    pub fn is(&self, key: &EntityKey) -> bool {
        self.key() == Some(key)
    }
}

/// Ordered/unordered split of one cached paginated list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPartition {
    /// Entries whose relative position the server has confirmed.
    pub ordered: Vec<ListEntry>,
    /// Entries known to belong to the list, position not yet confirmed.
    pub unordered: Vec<ListEntry>,
    /// Continuation token; `None` means the list is fully loaded.
    pub cursor: Option<PageCursor>,
    /// The sort order `ordered` was confirmed under.
    pub sort: Option<SortKey>,
}

impl ListPartition {
    /// An empty, fully-loaded partition with no recorded sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty partition recorded under `sort`.
    pub fn with_sort(sort: Option<SortKey>) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Total number of visible entries.
    pub fn len(&self) -> usize {
        self.ordered.len() + self.unordered.len()
    }

    /// Returns `true` if both partitions are empty.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty() && self.unordered.is_empty()
    }

    /// Returns `true` if no further pages exist on the server.
    pub fn is_fully_loaded(&self) -> bool {
        self.cursor.is_none()
    }

    /// Iterate the visible list: `ordered` then `unordered`.
    pub fn iter(&self) -> impl Iterator<Item = &ListEntry> {
        self.ordered.iter().chain(self.unordered.iter())
    }

    /// The visible list as an owned vector.
    pub fn visible(&self) -> Vec<ListEntry> {
        self.iter().cloned().collect()
    }

    /// Iterate the keys of all identifiable entries.
    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.iter().filter_map(ListEntry::key)
    }

    /// Whether `key` appears in either partition.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.iter().any(|entry| entry.is(key))
    }

    /// Position of `key` in the visible (`ordered ++ unordered`) list.
    pub fn index_of(&self, key: &EntityKey) -> Option<usize> {
        self.iter().position(|entry| entry.is(key))
    }

    /// Remove `key` from whichever partition holds it, returning its former
    /// visible index. No-op (`None`) if absent.
    pub fn remove(&mut self, key: &EntityKey) -> Option<usize> {
        if let Some(i) = self.ordered.iter().position(|e| e.is(key)) {
            self.ordered.remove(i);
            return Some(i);
        }
        if let Some(i) = self.unordered.iter().position(|e| e.is(key)) {
            self.unordered.remove(i);
            return Some(self.ordered.len() + i);
        }
        None
    }
}

/// A list fetched as `(cursor, limit)` rather than accumulated page by page
/// (e.g. a node's share members).
///
/// Keeping the request shape alongside the items lets the read policy decide
/// whether a cached answer already dominates a new request and can be
/// returned without a round-trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundedList {
    pub items: Vec<ListEntry>,
    /// Continuation token after the cached window, if any.
    pub cursor: Option<PageCursor>,
    /// The limit the cached window was fetched with.
    pub limit: usize,
}

/// The `(cursor, limit)` shape of an incoming bounded-list request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundedRequest {
    pub cursor: Option<PageCursor>,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{NodeId, TypeName};

    fn key(id: &str) -> EntityKey {
        EntityKey::new(TypeName::new("Node"), NodeId::new(id).unwrap())
    }

    fn entry(id: &str) -> ListEntry {
        ListEntry::Keyed(key(id))
    }

    fn partition(ordered: &[&str], unordered: &[&str]) -> ListPartition {
        ListPartition {
            ordered: ordered.iter().map(|id| entry(id)).collect(),
            unordered: unordered.iter().map(|id| entry(id)).collect(),
            cursor: None,
            sort: None,
        }
    }

    #[test]
    fn visible_is_ordered_then_unordered() {
        let p = partition(&["a", "b"], &["c"]);
        let ids: Vec<_> = p.keys().map(|k| k.id.as_str().to_string()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn index_of_spans_both_partitions() {
        let p = partition(&["a", "b"], &["c"]);
        assert_eq!(p.index_of(&key("a")), Some(0));
        assert_eq!(p.index_of(&key("c")), Some(2));
        assert_eq!(p.index_of(&key("z")), None);
    }

    #[test]
    fn remove_reports_former_visible_index() {
        let mut p = partition(&["a", "b"], &["c"]);
        assert_eq!(p.remove(&key("c")), Some(2));
        assert_eq!(p.remove(&key("a")), Some(0));
        assert_eq!(p.remove(&key("a")), None);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn fully_loaded_tracks_cursor() {
        let mut p = partition(&["a"], &[]);
        assert!(p.is_fully_loaded());
        p.cursor = Some(PageCursor::new("tok"));
        assert!(!p.is_fully_loaded());
    }

    #[test]
    fn inline_entries_have_no_key() {
        let inline = ListEntry::Inline(FieldMap::new());
        assert_eq!(inline.key(), None);
        assert!(!inline.is(&key("a")));
    }
}
