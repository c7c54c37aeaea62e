//! Keys identifying which arguments produced a cached list.
//!
//! A [`FilterKey`] canonicalizes a request's filter arguments (everything
//! except the pagination cursor) so that distinct filter combinations never
//! share accumulated list state. A [`SortKey`] records the sort order a list
//! was fetched under, so a sort change can be detected and the stale list
//! dropped wholesale instead of partially merged.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Argument names stripped before canonicalization: pagination state must
/// never contribute to the filter identity of a list.
const CURSOR_ARGS: &[&str] = &["cursor", "anchor", "page"];

/// Canonicalized filter arguments keying one accumulated result set.
///
/// Two requests with the same filters but different page cursors map to the
/// same `FilterKey`; two requests differing in any filter argument map to
/// different keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterKey(String);

impl FilterKey {
    /// Canonicalize `args` into a key: cursor arguments are stripped at the
    /// top level, then the remainder is rendered with object keys sorted
    /// recursively (array order is preserved — it is data, not shape).
    pub fn from_args(args: &Value) -> Self {
        let mut out = String::new();
        match args {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map
                    .iter()
                    .filter(|(k, _)| !CURSOR_ARGS.contains(&k.as_str()))
                    .collect();
                entries.sort_by_key(|(k, _)| *k);
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_canonical(&Value::String((*k).clone()), &mut out);
                    out.push(':');
                    write_canonical(v, &mut out);
                }
                out.push('}');
            }
            other => write_canonical(other, &mut out),
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterKey({})", self.0)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(k, _)| *k);
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(&Value::String((*k).clone()), out);
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars serialize deterministically on their own.
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Opaque rendering of the sort arguments a list was fetched under.
///
/// Compared for equality only. A cached list whose recorded `SortKey`
/// differs from the currently active one is stale: its relative order was
/// confirmed under a different comparator and cannot be merged into.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey(String);

impl SortKey {
    pub fn new(rendering: impl Into<String>) -> Self {
        Self(rendering.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortKey({})", self.0)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
