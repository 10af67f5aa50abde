//! Typed function representation for the function backend.
//!
//! A [`Function`] pairs a [`Signature`] (ordered input and output types) with
//! a [`Composition`] of bodies. Bodies are capabilities looked up by type:
//! a [`TupleCallBody`] executes on the host over [`Tuple`]s, other crates
//! (e.g. `fn_llvm`) attach bodies that emit native code.
//!
//! Types follow the same pattern: a [`Type`] is a name plus a composition of
//! extensions. [`CpuTypeInfo`] describes how values live in host memory and
//! is what tuples are laid out from.
//!
//! # Key Types
//!
//! - [`Composition`] / [`Extension`]: capability map keyed by extension type
//! - [`Type`], [`SharedType`], [`CpuTypeInfo`]: runtime type descriptors
//! - [`TupleMeta`], [`Tuple`]: fixed-layout heterogeneous records
//! - [`Signature`], [`Function`], [`SharedFunction`]: function interfaces
//! - [`TupleCallBody`], [`ExecutionContext`]: host execution
//!
//! # Threading
//!
//! Everything here is `Rc`-based and confined to one thread. Callers that
//! evaluate independent graphs in parallel build one set of functions per
//! thread.

mod builtin_types;
mod compose;
mod composition;
mod cpu_type_info;
mod error;
mod function;
mod signature;
mod tuple;
mod tuple_call;
mod types;

pub use builtin_types::{
    get_bool_type, get_float3_type, get_float_type, get_int32_type, get_string_type,
    type_by_name, Float3,
};
pub use compose::compose_sequence;
pub use composition::{Composition, Extension};
pub use cpu_type_info::{CpuTypeInfo, CpuTypeInfoForType};
pub use error::{CompositionError, MissingExtension, TupleMetaError};
pub use function::{Function, SharedFunction};
pub use signature::{InputParameter, OutputParameter, Signature};
pub use tuple::{Tuple, TupleMeta};
pub use tuple_call::{call_in_frame, ExecutionContext, ExecutionStack, TupleCallBody};
pub use types::{SharedType, Type};
