//! Bounded `(cursor, limit)` lists, used for share members.
//!
//! Unlike the accumulated partitions of `merge`, a bounded list remembers
//! the request shape that produced it. That lets the read path answer a new
//! request from cache whenever the cached window already dominates it,
//! skipping the network round-trip entirely.

use tracing::debug;

use canopy_store::{Broadcast, EntityStore};
use canopy_types::{BoundedList, BoundedRequest, ListEntry, PageCursor};

use crate::merge::IncomingItem;

/// Whether the cached window already answers `request`.
///
/// True when the request is not a continuation and either the cached limit
/// covers the requested one, or fewer items are cached than were last asked
/// for — the server had no more to give, so a larger limit cannot yield
/// more.
pub fn satisfies(cached: &BoundedList, request: &BoundedRequest) -> bool {
    request.cursor.is_none()
        && (cached.limit >= request.limit || cached.items.len() < cached.limit)
}

/// Merge a fetched window into the cached bounded list.
///
/// - A continuation (request cursor matching the cached one) appends the
///   new items, deduplicated by key, and extends the recorded limit.
/// - A request the cache already dominates leaves the cache unchanged.
/// - Anything else (first fetch, larger limit, unrecognized cursor)
///   replaces the cached window outright.
pub fn merge_bounded(
    store: &mut EntityStore,
    existing: Option<BoundedList>,
    incoming: Vec<IncomingItem>,
    incoming_cursor: Option<PageCursor>,
    request: &BoundedRequest,
) -> BoundedList {
    let entries = normalize(store, incoming);

    let Some(cached) = existing else {
        return BoundedList {
            items: entries,
            cursor: incoming_cursor,
            limit: request.limit,
        };
    };

    let continuation =
        request.cursor.is_some() && request.cursor == cached.cursor;
    if continuation {
        let mut extended = cached;
        for entry in entries {
            let duplicate = entry
                .key()
                .is_some_and(|key| extended.items.iter().any(|e| e.is(key)));
            if !duplicate {
                extended.items.push(entry);
            }
        }
        extended.cursor = incoming_cursor;
        extended.limit += request.limit;
        return extended;
    }

    if satisfies(&cached, request) {
        debug!(
            cached_limit = cached.limit,
            requested = request.limit,
            "bounded request dominated by cache"
        );
        return cached;
    }

    BoundedList {
        items: entries,
        cursor: incoming_cursor,
        limit: request.limit,
    }
}

fn normalize(store: &mut EntityStore, incoming: Vec<IncomingItem>) -> Vec<ListEntry> {
    incoming
        .into_iter()
        .map(|item| match item.key {
            Some(key) => {
                store.write_fragment(key.clone(), item.fields, Broadcast::Notify);
                ListEntry::Keyed(key)
            }
            None => ListEntry::Inline(item.fields),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_types::{EntityKey, FieldMap, NodeId, TypeName};

    fn key(id: &str) -> EntityKey {
        EntityKey::new(TypeName::new("Member"), NodeId::new(id).unwrap())
    }

    fn item(id: &str) -> IncomingItem {
        IncomingItem::keyed(key(id), FieldMap::new())
    }

    fn request(cursor: Option<&str>, limit: usize) -> BoundedRequest {
        BoundedRequest {
            cursor: cursor.map(PageCursor::new),
            limit,
        }
    }

    fn cached(ids: &[&str], cursor: Option<&str>, limit: usize) -> BoundedList {
        BoundedList {
            items: ids.iter().map(|id| ListEntry::Keyed(key(id))).collect(),
            cursor: cursor.map(PageCursor::new),
            limit,
        }
    }

    #[test]
    fn covering_limit_satisfies_smaller_request() {
        assert!(satisfies(&cached(&["a", "b"], None, 10), &request(None, 5)));
        assert!(satisfies(&cached(&["a", "b"], None, 10), &request(None, 10)));
    }

    #[test]
    fn exhausted_server_satisfies_any_first_request() {
        // 2 items cached for a limit of 10: the server has no more.
        assert!(satisfies(&cached(&["a", "b"], None, 10), &request(None, 50)));
    }

    #[test]
    fn larger_request_is_not_satisfied() {
        assert!(!satisfies(
            &cached(&["a", "b", "c"], Some("next"), 3),
            &request(None, 10)
        ));
    }

    #[test]
    fn continuation_is_never_satisfied_from_cache() {
        assert!(!satisfies(
            &cached(&["a"], Some("next"), 1),
            &request(Some("next"), 1)
        ));
    }

    #[test]
    fn first_fetch_records_request_shape() {
        let mut store = EntityStore::new();
        let merged = merge_bounded(
            &mut store,
            None,
            vec![item("a"), item("b")],
            Some(PageCursor::new("next")),
            &request(None, 2),
        );
        assert_eq!(merged.items.len(), 2);
        assert_eq!(merged.limit, 2);
        assert_eq!(merged.cursor, Some(PageCursor::new("next")));
    }

    #[test]
    fn continuation_extends_and_dedupes() {
        let mut store = EntityStore::new();
        let merged = merge_bounded(
            &mut store,
            Some(cached(&["a", "b"], Some("next"), 2)),
            vec![item("b"), item("c")],
            None,
            &request(Some("next"), 2),
        );
        let ids: Vec<_> = merged
            .items
            .iter()
            .filter_map(ListEntry::key)
            .map(|k| k.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(merged.limit, 4);
        assert!(merged.cursor.is_none());
    }

    #[test]
    fn dominated_request_leaves_cache_unchanged() {
        let mut store = EntityStore::new();
        let before = cached(&["a", "b"], None, 10);
        let merged = merge_bounded(
            &mut store,
            Some(before.clone()),
            vec![item("z")],
            None,
            &request(None, 5),
        );
        assert_eq!(merged, before);
    }

    #[test]
    fn larger_limit_replaces_the_window() {
        let mut store = EntityStore::new();
        let merged = merge_bounded(
            &mut store,
            Some(cached(&["a"], Some("next"), 1)),
            vec![item("a"), item("b"), item("c")],
            None,
            &request(None, 3),
        );
        let ids: Vec<_> = merged
            .items
            .iter()
            .filter_map(ListEntry::key)
            .map(|k| k.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(merged.limit, 3);
    }
}
