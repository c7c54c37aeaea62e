//! Normalized in-memory entity store for the Canopy cache.
//!
//! This crate implements the object store at the bottom of the consistency
//! layer: a key-addressed map from [`EntityKey`](canopy_types::EntityKey) to
//! a field map, written fragment-by-fragment and read back by the policies
//! in `canopy-lists` and the updaters in `canopy-mutate`.
//!
//! # Design Rules
//!
//! 1. At most one entity per key; writes merge field-by-field, last write
//!    wins per field.
//! 2. Every operation runs synchronously to completion on `&mut self` —
//!    the cache is single-threaded and cooperative, so there is no locking.
//! 3. Writes notify dependents through the broadcast journal unless the
//!    caller asks for a silent write (lazy backfill).
//! 4. Eviction of a missing key or field is a no-op, never an error.
//! 5. Garbage collection is explicit: a reachability sweep from the
//!    retained roots, invoked by the mutation layer after evictions.

pub mod entity;
pub mod gc;
pub mod snapshot;
pub mod store;

pub use entity::Entity;
pub use snapshot::StoreSnapshot;
pub use store::{Broadcast, EntityStore, FieldUpdate, FieldUpdater};
