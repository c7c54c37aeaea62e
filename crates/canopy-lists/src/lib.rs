//! List merge and field read policies for the Canopy cache.
//!
//! A paginated list lives in the cache as a [`ListPartition`]: an `ordered`
//! partition whose relative positions the server has confirmed, and an
//! `unordered` partition of items known to belong to the list but not yet
//! placed. This crate reconciles incoming server pages with that shape
//! ([`merge_page`], [`merge_filtered`], [`merge_bounded`]) and computes the
//! externally visible value of a cached list ([`read_list`],
//! [`read_children`], [`read_bounded`]).
//!
//! Which policy applies to which field is decided once, at cache
//! construction, through the [`PolicyRegistry`].
//!
//! [`ListPartition`]: canopy_types::ListPartition

pub mod bounded;
pub mod fields;
pub mod merge;
pub mod policy;
pub mod read;

pub use bounded::{merge_bounded, satisfies};
pub use merge::{merge_filtered, merge_page, IncomingItem, MergeContext};
pub use policy::{FieldPolicy, MergeStrategy, PolicyRegistry, ReadStrategy};
pub use read::{read_bounded, read_children, read_list};
