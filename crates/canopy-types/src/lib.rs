//! Foundation types for the Canopy cache.
//!
//! This crate provides the identity, field-value, and list-shape types used
//! throughout the Canopy system. Every other Canopy crate depends on
//! `canopy-types`.
//!
//! # Key Types
//!
//! - [`EntityKey`] — Stable cache address of a normalized entity (`TypeName` + `NodeId`)
//! - [`FieldValue`] / [`FieldMap`] — Per-entity field storage, scalars and references
//! - [`ListPartition`] — Ordered/unordered split of one cached paginated list
//! - [`PageCursor`] — Opaque pagination continuation token
//! - [`FilterKey`] — Canonicalized filter arguments keying filtered result sets
//! - [`SortKey`] — Opaque rendering of the sort order a list was fetched under

pub mod error;
pub mod field;
pub mod filter;
pub mod id;
pub mod list;
pub mod page;

pub use error::TypeError;
pub use field::{FieldMap, FieldValue};
pub use filter::{FilterKey, SortKey};
pub use id::{EntityKey, FieldName, NodeId, TypeName};
pub use list::{BoundedList, BoundedRequest, ListEntry, ListPartition};
pub use page::PageCursor;
