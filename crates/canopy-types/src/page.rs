use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque pagination continuation token.
///
/// Attached to a cached list: `Some(cursor)` means more pages exist on the
/// server, `None` (absent) means the list is fully loaded. The cache never
/// inspects the token's contents.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageCursor({})", self.0)
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageCursor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
