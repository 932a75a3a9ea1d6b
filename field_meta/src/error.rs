//! Error types raised while registering or looking up field metadata.

use thiserror::Error;

/// Errors produced by metadata registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MetaError {
    /// A second entry was registered for an existing (type, field, channel) key.
    #[error("metadata for `{type_name}.{field}` is already registered on channel `{channel}`")]
    DuplicateFieldMetadata {
        /// Channel the entry belongs to.
        channel: String,
        /// Declared type name.
        type_name: String,
        /// Field name.
        field: String,
    },

    /// A lookup or retrofit named a field the type does not declare.
    #[error("type `{type_name}` has no field `{field}` on channel `{channel}`")]
    UnknownField {
        /// Channel the lookup was made on.
        channel: String,
        /// Declared type name.
        type_name: String,
        /// Field name that could not be resolved.
        field: String,
    },

    /// A type was declared again with a different field layout.
    #[error(
        "type `{type_name}` is declared with fields {declared:?} on channel `{channel}`, \
         not {found:?}"
    )]
    LayoutConflict {
        /// Channel holding the first declaration.
        channel: String,
        /// Declared type name.
        type_name: String,
        /// Fields of the first declaration, in order.
        declared: Vec<String>,
        /// Fields of the conflicting declaration, in order.
        found: Vec<String>,
    },

    /// A registry set was asked for a channel it does not hold.
    #[error("unknown metadata channel `{channel}`")]
    UnknownChannel {
        /// Requested channel name.
        channel: String,
    },
}

/// Result alias for registry operations.
pub type MetaResult<T> = Result<T, MetaError>;
