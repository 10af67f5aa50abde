//! Errors raised while emitting or JIT-compiling native code.

use inkwell::builder::BuilderError;
use thiserror::Error;

use fn_core::{MissingExtension, TupleMetaError};

/// Failure in the native code emission layer.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The instruction builder rejected an instruction (e.g. unpositioned).
    #[error("LLVM builder error: {0}")]
    Builder(#[from] BuilderError),
    /// A type has no native lowering.
    #[error(transparent)]
    MissingExtension(#[from] MissingExtension),
    /// A tuple layout could not be computed.
    #[error(transparent)]
    TupleMeta(#[from] TupleMetaError),
    /// A function has neither an IR body nor a tuple call body.
    #[error("function `{function}` has no body that can be compiled")]
    MissingBody { function: String },
    /// An IR body returned the wrong number of values.
    #[error("body of `{function}` produced {found} values, signature declares {expected}")]
    OutputCount {
        function: String,
        expected: usize,
        found: usize,
    },
    /// Generated IR does not have the expected shape.
    #[error("malformed IR: {0}")]
    Instruction(String),
    /// The module failed LLVM verification.
    #[error("module verification failed: {0}")]
    Verify(String),
    /// The JIT engine could not be created or the entry point was not found.
    #[error("JIT compilation failed: {0}")]
    Jit(String),
}
