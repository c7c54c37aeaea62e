use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Server-assigned identifier of a drive node (file, folder, share, member).
///
/// Opaque to the cache: ids are never parsed or generated locally, only
/// compared for equality and used as map keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap a server-assigned id. Rejects the empty string: an entity
    /// without an id has no stable cache address.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(id))
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The type portion of an entity's cache address (e.g. `"Node"`, `"Share"`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Name of one field within an entity's field map.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldName({})", self.0)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Stable cache address of a normalized entity: `TypeName` + `NodeId`.
///
/// At most one entity exists per key; all writes for the same key merge
/// into the same field map.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub type_name: TypeName,
    pub id: NodeId,
}

impl EntityKey {
    pub fn new(type_name: TypeName, id: NodeId) -> Self {
        Self { type_name, id }
    }

    /// Parse a `"Type:id"` rendering produced by [`Display`](fmt::Display).
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let (type_name, id) = s
            .split_once(':')
            .ok_or_else(|| TypeError::MalformedKey(s.to_string()))?;
        if type_name.is_empty() {
            return Err(TypeError::MalformedKey(s.to_string()));
        }
        Ok(Self {
            type_name: TypeName::new(type_name),
            id: NodeId::new(id)?,
        })
    }
}

impl fmt::Debug for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({}:{})", self.type_name, self.id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_rejects_empty() {
        assert_eq!(NodeId::new(""), Err(TypeError::EmptyId));
    }

    #[test]
    fn entity_key_display_roundtrip() {
        let key = EntityKey::new(TypeName::new("Node"), NodeId::new("abc123").unwrap());
        let rendered = key.to_string();
        assert_eq!(rendered, "Node:abc123");
        assert_eq!(EntityKey::parse(&rendered).unwrap(), key);
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(matches!(
            EntityKey::parse("Nodeabc"),
            Err(TypeError::MalformedKey(_))
        ));
    }

    #[test]
    fn parse_rejects_empty_parts() {
        assert!(EntityKey::parse(":abc").is_err());
        assert!(EntityKey::parse("Node:").is_err());
    }

    #[test]
    fn keys_with_same_parts_are_equal() {
        let a = EntityKey::new("Node".into(), NodeId::new("x").unwrap());
        let b = EntityKey::new("Node".into(), NodeId::new("x").unwrap());
        assert_eq!(a, b);
    }
}
