//! LLVM emission layer for the function backend
//!
//! Lowers function signatures to native function types, provides the
//! primitives generated code uses to reach host memory (embedded addresses,
//! tuple field lookup, stack buffers, indirect calls) and JIT-compiles
//! functions into native [`TupleCallBody`](fn_core::TupleCallBody)
//! implementations.
//!
//! # Debug Environment Variables
//!
//! - `FN_DEBUG_LLVM`: Print LLVM IR to stderr before JIT compilation when
//!   the config comes from [`JitConfig::from_env`].
//!   Example: `FN_DEBUG_LLVM=1 cargo test`
//!
//! - `RUST_LOG=fn_llvm=debug`: Log function compilation.
//!
//! - `RUST_LOG=fn_llvm=trace`: Also log every emitted tuple call.

// Crate-level lint configuration for codegen-specific patterns
#![allow(
    // LLVM uses u32 for struct indices and array lengths, tuples use usize
    clippy::cast_possible_truncation,
    reason = "emission code converts between host and LLVM integer widths"
)]
//!
//! # Key Types
//!
//! - [`SimpleCx`]: LLVM context, module and common types
//! - [`IrBuilder`]: instruction builder bound to a `SimpleCx`
//! - [`LlvmTypeInfo`]: per-type lowering, attached as a type extension
//! - [`LlvmBuildIrBody`]: function bodies that emit IR
//! - [`CompiledFunction`]: a JIT-compiled function usable as a tuple body

pub mod builder;
pub mod compile;
pub mod config;
pub mod context;
pub mod error;
pub mod ir_body;
pub mod ir_utils;
pub mod tuple_call_ir;
pub mod type_info;

#[cfg(test)]
mod tests;

use std::sync::Once;

pub use builder::IrBuilder;
pub use compile::{compile_function, CompiledFunction, ENTRY_NAME};
pub use config::JitConfig;
pub use context::SimpleCx;
pub use error::EmitError;
pub use ir_body::LlvmBuildIrBody;
pub use ir_utils::{
    alloca_bytes, byte_ptr_to_ir, call_pointer, function_type_from_signature, int_ptr_to_ir,
    lookup_tuple_address, output_struct_type, ptr_to_ir, types_of_type_infos, types_of_values,
    void_ptr_to_ir, LlvmTypes,
};
pub use tuple_call_ir::{build_tuple_call_body_ir, TupleCallIrBody};
pub use type_info::{register_llvm_types, LlvmTypeInfo, ScalarLlvmTypeInfo};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debugging.
///
/// Call once at program start. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
