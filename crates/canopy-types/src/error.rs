use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty identifier")]
    EmptyId,

    #[error("malformed entity key: {0}")]
    MalformedKey(String),
}
