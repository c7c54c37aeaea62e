//! High-level API for the Canopy cache.
//!
//! [`Cache`] is the single entry point the query/mutation layer talks to:
//! it owns the normalized [`EntityStore`], resolves per-field policies
//! through the [`PolicyRegistry`] once at construction, and exposes the
//! fragment, merge, read, insert, remove, eviction, and GC operations of
//! the underlying crates as one surface.
//!
//! ```
//! use canopy_sdk::{schema, Cache, ListRequest, PageResult};
//! use canopy_lists::IncomingItem;
//! use canopy_types::{FieldMap, NodeId};
//!
//! let mut cache = Cache::new();
//! let folder = Cache::identify(schema::node(), NodeId::new("folder-1").unwrap());
//! cache.retain(folder.clone());
//!
//! let child = Cache::identify(schema::node(), NodeId::new("file-1").unwrap());
//! cache
//!     .merge_list_field(
//!         &folder,
//!         &canopy_lists::fields::children(),
//!         &ListRequest::default(),
//!         PageResult {
//!             items: vec![IncomingItem::keyed(child, FieldMap::new())],
//!             next: None,
//!         },
//!     )
//!     .unwrap();
//! ```
//!
//! [`EntityStore`]: canopy_store::EntityStore
//! [`PolicyRegistry`]: canopy_lists::PolicyRegistry

pub mod cache;
pub mod error;
pub mod schema;

pub use cache::{Cache, ListRequest, PageResult};
pub use error::{CacheError, CacheResult};
