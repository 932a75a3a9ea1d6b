//! Error types produced while generating field metadata accessors.

use field_meta::MetaError;
use thiserror::Error;

/// Errors that can occur while parsing, composing, or expanding annotations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodegenError {
    /// The input held annotations but no struct declaration to apply them to.
    #[error("no struct declaration found in the annotated input")]
    NoDeclarationFound,

    /// A chain was composed from an empty member list.
    #[error("chain `{chain}` must list at least one channel")]
    EmptyChain {
        /// Name of the rejected chain.
        chain: String,
    },

    /// An annotation name was applied or composed but never registered.
    #[error("unknown annotation `{name}`")]
    UnknownAnnotation {
        /// The unresolved name.
        name: String,
    },

    /// An annotation name was registered twice.
    #[error("annotation `{name}` is already registered")]
    DuplicateAnnotation {
        /// The conflicting name.
        name: String,
    },

    /// A field still carries metadata layers once every annotation ran.
    #[error("field `{type_name}.{field}` has metadata left after every annotation was applied")]
    UnconsumedMetadata {
        /// Declared type name.
        type_name: String,
        /// Field with leftover layers.
        field: String,
    },

    /// Registering or looking up an accessor entry failed.
    #[error(transparent)]
    Registry(#[from] MetaError),

    /// The annotated input is not valid declaration syntax.
    #[error("invalid annotated declaration: {0}")]
    Syntax(#[from] syn::Error),

    /// Loading the code generation configuration failed.
    #[error("failed to load code generation configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl CodegenError {
    /// Builds the duplicate-entry error for a (type, field, channel) key.
    pub(crate) fn duplicate(channel: &str, type_name: &str, field: &str) -> Self {
        Self::Registry(MetaError::DuplicateFieldMetadata {
            channel: channel.to_owned(),
            type_name: type_name.to_owned(),
            field: field.to_owned(),
        })
    }

    /// Builds the unknown-field error for a (type, field, channel) key.
    pub(crate) fn unknown_field(channel: &str, type_name: &str, field: &str) -> Self {
        Self::Registry(MetaError::UnknownField {
            channel: channel.to_owned(),
            type_name: type_name.to_owned(),
            field: field.to_owned(),
        })
    }
}

/// Result alias for code generation.
pub type CodegenResult<T> = Result<T, CodegenError>;
