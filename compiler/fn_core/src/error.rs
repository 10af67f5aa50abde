//! Error types for capability lookup, tuple layout and composition.

use thiserror::Error;

/// A type lacks a capability the caller needs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("type `{type_name}` has no `{extension}` extension")]
pub struct MissingExtension {
    /// Name of the type that was queried.
    pub type_name: String,
    /// Identifier of the missing extension.
    pub extension: &'static str,
}

/// Building a [`TupleMeta`](crate::TupleMeta) failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TupleMetaError {
    /// A field type cannot live in host memory.
    #[error(transparent)]
    MissingExtension(#[from] MissingExtension),
    /// The combined size or alignment is not a valid allocation layout.
    #[error("invalid tuple layout: {0}")]
    Layout(#[from] std::alloc::LayoutError),
    /// A field offset does not fit the `u32` offsets table.
    #[error("tuple field offset {offset} exceeds the u32 offsets table")]
    TooLarge { offset: usize },
}

/// Two functions cannot be composed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// A function has no host body to execute.
    #[error("function `{function}` has no tuple call body")]
    MissingBody { function: String },
    /// Output count of the first function differs from input count of the second.
    #[error("`{first}` produces {outputs} values but `{second}` takes {inputs}")]
    ArityMismatch {
        first: String,
        outputs: usize,
        second: String,
        inputs: usize,
    },
    /// Output and input at the same position have different types.
    #[error("value {index} has type `{found}` but `{expected}` is expected")]
    TypeMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error(transparent)]
    Meta(#[from] TupleMetaError),
}
