//! Positional insertion into a cached list partition.
//!
//! The caller computes the desired index by replicating the server's sort
//! order against the already-loaded `ordered` items (see [`sorted_index`]),
//! so the optimistic position matches the one the server will eventually
//! confirm. An index the cache cannot place (its covering page is not
//! loaded) degrades to the tail of `unordered`.

use canopy_types::{EntityKey, ListEntry, ListPartition};

/// Where an insert actually landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Visible (`ordered ++ unordered`) index of the inserted entry.
    pub final_index: usize,
    /// Whether the entry is now the last visible item.
    pub is_last: bool,
}

/// Insert `key` into `partition` at `desired_index` (`None` = position
/// unknown).
///
/// Any prior occurrence of `key` is removed first; if it sat before the
/// desired index, the index shifts down by one so it keeps naming the same
/// conceptual slot. An index inside `ordered` splices there; an index in
/// the combined range splices into `unordered` — but only when the item was
/// already present or `allow_unordered_fallback` is set, since an item the
/// list never contained must not be guessed into it. An unplaceable index
/// appends to the tail of `unordered` under the same condition, or does
/// nothing (`None`).
pub fn insert_at(
    partition: &mut ListPartition,
    key: EntityKey,
    desired_index: Option<usize>,
    allow_unordered_fallback: bool,
) -> Option<InsertOutcome> {
    let was_present = partition.contains(&key);
    let mut desired = desired_index;
    if let Some(removed_at) = partition.remove(&key) {
        if let Some(d) = desired {
            if removed_at < d {
                desired = Some(d - 1);
            }
        }
    }
    let may_guess = was_present || allow_unordered_fallback;

    if let Some(d) = desired {
        if d < partition.ordered.len() {
            partition.ordered.insert(d, ListEntry::Keyed(key));
            return Some(outcome(partition, d));
        }
        if d <= partition.len() && may_guess {
            let offset = d - partition.ordered.len();
            partition.unordered.insert(offset, ListEntry::Keyed(key));
            return Some(outcome(partition, d));
        }
    }

    if may_guess {
        partition.unordered.push(ListEntry::Keyed(key));
        return Some(outcome(partition, partition.len() - 1));
    }
    None
}

fn outcome(partition: &ListPartition, final_index: usize) -> InsertOutcome {
    InsertOutcome {
        final_index,
        is_last: final_index + 1 == partition.len(),
    }
}

/// Compute the desired index for an item against the loaded `ordered`
/// partition, given a comparator replicating the server's sort order.
///
/// `sorts_after(key)` must return `true` when the existing entry sorts
/// after the new item. Returns the first such position; when every loaded
/// entry sorts before the item, the end position is known only if the list
/// is fully loaded — otherwise the item's slot lies on an unfetched page
/// and the result is `None`.
pub fn sorted_index(
    partition: &ListPartition,
    mut sorts_after: impl FnMut(&EntityKey) -> bool,
) -> Option<usize> {
    for (i, entry) in partition.ordered.iter().enumerate() {
        if let Some(key) = entry.key() {
            if sorts_after(key) {
                return Some(i);
            }
        }
    }
    partition
        .is_fully_loaded()
        .then(|| partition.ordered.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_types::{NodeId, PageCursor, TypeName};

    fn key(id: &str) -> EntityKey {
        EntityKey::new(TypeName::new("Node"), NodeId::new(id).unwrap())
    }

    fn partition(ordered: &[&str], unordered: &[&str]) -> ListPartition {
        ListPartition {
            ordered: ordered.iter().map(|id| ListEntry::Keyed(key(id))).collect(),
            unordered: unordered
                .iter()
                .map(|id| ListEntry::Keyed(key(id)))
                .collect(),
            cursor: None,
            sort: None,
        }
    }

    fn ordered_ids(p: &ListPartition) -> Vec<&str> {
        p.ordered
            .iter()
            .filter_map(ListEntry::key)
            .map(|k| k.id.as_str())
            .collect()
    }

    fn unordered_ids(p: &ListPartition) -> Vec<&str> {
        p.unordered
            .iter()
            .filter_map(ListEntry::key)
            .map(|k| k.id.as_str())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    #[test]
    fn splices_into_ordered_at_index() {
        let mut p = partition(&["a", "b", "c"], &[]);
        let outcome = insert_at(&mut p, key("d"), Some(1), false).unwrap();

        assert_eq!(ordered_ids(&p), ["a", "d", "b", "c"]);
        assert_eq!(outcome.final_index, 1);
        assert!(!outcome.is_last);
    }

    #[test]
    fn index_in_combined_range_needs_presence_or_fallback() {
        // d == ordered.len(): the slot is past the confirmed region.
        let mut p = partition(&["a"], &["x"]);
        assert!(insert_at(&mut p, key("d"), Some(1), false).is_none());
        assert_eq!(p.len(), 2);

        let outcome = insert_at(&mut p, key("d"), Some(1), true).unwrap();
        assert_eq!(unordered_ids(&p), ["d", "x"]);
        assert_eq!(outcome.final_index, 1);
    }

    #[test]
    fn unknown_index_appends_to_unordered_tail() {
        let mut p = partition(&["a", "b"], &["x"]);
        let outcome = insert_at(&mut p, key("d"), None, true).unwrap();

        assert_eq!(unordered_ids(&p), ["x", "d"]);
        assert_eq!(outcome.final_index, 3);
        assert!(outcome.is_last);
    }

    #[test]
    fn out_of_range_index_degrades_to_tail() {
        let mut p = partition(&["a"], &[]);
        let outcome = insert_at(&mut p, key("d"), Some(99), true).unwrap();
        assert_eq!(unordered_ids(&p), ["d"]);
        assert_eq!(outcome.final_index, 1);
    }

    #[test]
    fn absent_item_without_fallback_is_left_out() {
        let mut p = partition(&["a"], &[]);
        assert!(insert_at(&mut p, key("d"), None, false).is_none());
        assert!(!p.contains(&key("d")));
    }

    // -----------------------------------------------------------------------
    // Reinsertion
    // -----------------------------------------------------------------------

    #[test]
    fn reinsert_removes_prior_occurrence() {
        let mut p = partition(&["a", "b", "c"], &[]);
        // Move "a" after "b": desired index computed against the list with
        // "a" still in it is 2; removal at 0 shifts it to 1.
        let outcome = insert_at(&mut p, key("a"), Some(2), false).unwrap();

        assert_eq!(ordered_ids(&p), ["b", "a", "c"]);
        assert_eq!(outcome.final_index, 1);
    }

    #[test]
    fn reinsert_from_unordered_may_enter_unordered_without_fallback() {
        let mut p = partition(&["a"], &["m"]);
        // "m" was present, so the combined-range splice is allowed even
        // with the fallback off.
        let outcome = insert_at(&mut p, key("m"), Some(1), false).unwrap();
        assert_eq!(unordered_ids(&p), ["m"]);
        assert_eq!(outcome.final_index, 1);
        assert!(outcome.is_last);
    }

    #[test]
    fn removal_after_desired_index_does_not_shift_it() {
        let mut p = partition(&["a", "b", "c"], &[]);
        // Move "c" to the front: removal at 2 is not before index 0.
        let outcome = insert_at(&mut p, key("c"), Some(0), false).unwrap();
        assert_eq!(ordered_ids(&p), ["c", "a", "b"]);
        assert_eq!(outcome.final_index, 0);
    }

    // -----------------------------------------------------------------------
    // sorted_index
    // -----------------------------------------------------------------------

    #[test]
    fn sorted_index_finds_first_successor() {
        let p = partition(&["a", "c", "e"], &[]);
        // New item "d" sorts before "e" only.
        let idx = sorted_index(&p, |k| k.id.as_str() > "d");
        assert_eq!(idx, Some(2));
    }

    #[test]
    fn sorted_index_at_end_requires_full_load() {
        let mut p = partition(&["a", "b"], &[]);
        assert_eq!(sorted_index(&p, |_| false), Some(2));

        p.cursor = Some(PageCursor::new("more"));
        // The item's slot may be on an unfetched page.
        assert_eq!(sorted_index(&p, |_| false), None);
    }
}
