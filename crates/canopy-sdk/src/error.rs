use canopy_types::{EntityKey, FieldName, TypeName};
use thiserror::Error;

/// Errors from the cache facade.
///
/// These all mark misuse of the API surface (a field used without a
/// registered policy, or with the wrong request shape); the merge and read
/// policies themselves never fail on data.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No merge/read policy registered for this `(type, field)` pair.
    #[error("no policy registered for {type_name}.{field}")]
    NoPolicy {
        type_name: TypeName,
        field: FieldName,
    },

    /// A filtered field was accessed without filter arguments.
    #[error("field {field} is filtered but the request carries no filter arguments")]
    MissingFilterArgs { field: FieldName },

    /// A bounded field was accessed without a limit.
    #[error("field {field} is bounded but the request carries no limit")]
    MissingLimit { field: FieldName },

    /// The cached value at this field does not have the shape the
    /// registered policy expects.
    #[error("cached value at {entity}.{field} does not match its registered policy")]
    ShapeMismatch {
        entity: EntityKey,
        field: FieldName,
    },
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
