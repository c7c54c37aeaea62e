//! Mutation cache updaters for the Canopy cache.
//!
//! When a mutation completes (or is applied optimistically), the lists that
//! depended on the mutated nodes must stay visually correct until the next
//! successful refetch. This crate provides the generic primitives those
//! mutations call:
//!
//! - [`insert_at`] / [`sorted_index`] — place an item into a cached list at
//!   the position the server's sort order will eventually confirm.
//! - [`remove_ids`] — drop ids from every cached list a predicate selects,
//!   evicting lists that empty while only partially loaded.
//! - [`evict_children`] / [`evict_share_lists`] — wholesale invalidation
//!   after structural or permission-affecting changes.

pub mod insert;
pub mod invalidate;
pub mod remove;

pub use insert::{insert_at, sorted_index, InsertOutcome};
pub use invalidate::{evict_children, evict_share_lists};
pub use remove::{remove_ids, ListMetadata, RemovalStats};
