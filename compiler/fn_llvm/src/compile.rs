//! JIT compilation of functions to native tuple bodies.
//!
//! Compiling a function produces two native functions in a fresh module:
//!
//! - the body, named after the function, with the native type from
//!   [`function_type_from_signature`]: one parameter per input and an
//!   anonymous struct of outputs as return value;
//! - the tuple entry `void fn_tuple_entry(ptr in_data, ptr in_offsets,
//!   ptr out_data, ptr out_offsets)`, which loads each input from its tuple
//!   field, calls the body and stores each member of the returned struct
//!   into the output tuple.
//!
//! The entry receives the offsets tables at run time, so the compiled code
//! works with any tuple whose layout matches the signature.

use std::rc::Rc;

use inkwell::context::Context;
use inkwell::execution_engine::{ExecutionEngine, JitFunction};
use inkwell::module::Module;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, PointerValue};
use smallvec::SmallVec;

use fn_core::{ExecutionContext, SharedFunction, Tuple, TupleCallBody, TupleMeta};

use crate::builder::IrBuilder;
use crate::config::JitConfig;
use crate::context::SimpleCx;
use crate::error::EmitError;
use crate::ir_body::LlvmBuildIrBody;
use crate::ir_utils::{function_type_from_signature, lookup_tuple_address, output_struct_type};
use crate::tuple_call_ir::TupleCallIrBody;
use crate::type_info::LlvmTypeInfo;

/// Symbol of the generated tuple entry.
pub const ENTRY_NAME: &str = "fn_tuple_entry";

type TupleEntryFn = unsafe extern "C" fn(*const u8, *const u32, *mut u8, *const u32);

/// A function compiled to native code, callable as a [`TupleCallBody`].
///
/// Holds the function, its IR body and tuple layouts so every host address
/// embedded in the generated code stays valid. Lives no longer than the
/// LLVM context it was compiled in.
pub struct CompiledFunction<'ctx> {
    entry: JitFunction<'ctx, TupleEntryFn>,
    engine: ExecutionEngine<'ctx>,
    module: Module<'ctx>,
    function: SharedFunction,
    in_meta: Rc<TupleMeta>,
    out_meta: Rc<TupleMeta>,
    _ir_body: Rc<dyn LlvmBuildIrBody>,
}

impl<'ctx> CompiledFunction<'ctx> {
    pub fn function(&self) -> &SharedFunction {
        &self.function
    }

    /// Textual IR of the compiled module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn engine(&self) -> &ExecutionEngine<'ctx> {
        &self.engine
    }
}

impl TupleCallBody for CompiledFunction<'_> {
    fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple, _ctx: &mut ExecutionContext) {
        assert!(
            same_layout(fn_in.meta(), &self.in_meta),
            "input tuple does not match the inputs of `{}`",
            self.function.name()
        );
        assert!(
            same_layout(fn_out.meta(), &self.out_meta),
            "output tuple does not match the outputs of `{}`",
            self.function.name()
        );
        assert!(
            fn_in.all_initialized(),
            "inputs of `{}` not initialized",
            self.function.name()
        );

        // Outputs are plain data, written without reading the old values.
        fn_out.destruct_all();
        // SAFETY: the entry was generated for these layouts, reads only
        // initialized inputs and writes every output field
        unsafe {
            self.entry.call(
                fn_in.data_ptr(),
                fn_in.offsets_ptr(),
                fn_out.data_ptr_mut(),
                fn_out.offsets_ptr(),
            );
            fn_out.assume_all_initialized();
        }
    }
}

/// Whether `meta` holds the same field types as `expected`, in order.
fn same_layout(meta: &Rc<TupleMeta>, expected: &Rc<TupleMeta>) -> bool {
    Rc::ptr_eq(meta, expected)
        || (meta.len() == expected.len()
            && meta
                .types()
                .iter()
                .zip(expected.types())
                .all(|(ty, expected)| Rc::ptr_eq(ty, expected)))
}

/// The IR body used to compile `function`: its own
/// [`LlvmBuildIrBody`], or a call back into its [`TupleCallBody`].
fn ir_body_for(function: &SharedFunction) -> Result<Rc<dyn LlvmBuildIrBody>, EmitError> {
    if let Some(body) = function.body::<dyn LlvmBuildIrBody>() {
        return Ok(body);
    }
    let body: Rc<dyn LlvmBuildIrBody> = Rc::new(TupleCallIrBody::new(function)?);
    Ok(body)
}

/// Emit the native body of `function` into `scx`.
fn build_body<'ctx>(
    scx: &SimpleCx<'ctx>,
    function: &SharedFunction,
    ir_body: &dyn LlvmBuildIrBody,
) -> Result<FunctionValue<'ctx>, EmitError> {
    let signature = function.signature();
    let fn_type = function_type_from_signature(signature, scx.llcx)?;
    let native = scx.declare_fn(function.name(), fn_type);

    let bx = IrBuilder::new(scx);
    bx.start_block(native, "entry");
    let inputs: Vec<BasicValueEnum<'ctx>> = native.get_param_iter().collect();
    let outputs = ir_body.build_ir(&bx, &inputs)?;
    if outputs.len() != signature.outputs().len() {
        return Err(EmitError::OutputCount {
            function: function.name().to_string(),
            expected: signature.outputs().len(),
            found: outputs.len(),
        });
    }

    let mut aggregate = output_struct_type(signature, scx.llcx)?.get_undef();
    for (index, value) in (0u32..).zip(outputs) {
        aggregate = bx
            .raw()
            .build_insert_value(aggregate, value, index, "outputs")?
            .into_struct_value();
    }
    bx.raw().build_return(Some(&aggregate))?;
    Ok(native)
}

/// Emit the tuple entry that calls `native`.
fn build_tuple_entry<'ctx>(
    scx: &SimpleCx<'ctx>,
    function: &SharedFunction,
    native: FunctionValue<'ctx>,
) -> Result<FunctionValue<'ctx>, EmitError> {
    let signature = function.signature();
    let input_infos = signature.input_extensions::<dyn LlvmTypeInfo>()?;
    let output_infos = signature.output_extensions::<dyn LlvmTypeInfo>()?;

    let ptr_ty: BasicMetadataTypeEnum<'ctx> = scx.type_ptr().into();
    let entry_type = scx.type_void_func(&[ptr_ty; 4]);
    let entry = scx.declare_fn(ENTRY_NAME, entry_type);

    let bx = IrBuilder::new(scx);
    bx.start_block(entry, "entry");
    let params: SmallVec<[PointerValue<'ctx>; 4]> = entry
        .get_param_iter()
        .map(BasicValueEnum::into_pointer_value)
        .collect();
    let &[in_data, in_offsets, out_data, out_offsets] = params.as_slice() else {
        return Err(EmitError::Instruction(format!(
            "`{ENTRY_NAME}` has {} parameters, expected 4",
            params.len()
        )));
    };

    let mut arguments: SmallVec<[BasicMetadataValueEnum<'ctx>; 8]> = SmallVec::new();
    for (index, info) in (0u32..).zip(&input_infos) {
        let addr = lookup_tuple_address(&bx, in_data, in_offsets, index)?;
        arguments.push(info.build_load_ir(&bx, addr)?.into());
    }
    let outputs = bx
        .raw()
        .build_call(native, &arguments, "outputs")?
        .try_as_basic_value()
        .basic()
        .ok_or_else(|| {
            EmitError::Instruction(format!("call to `{}` produced no value", function.name()))
        })?
        .into_struct_value();

    for (index, info) in (0u32..).zip(&output_infos) {
        let value = bx.raw().build_extract_value(outputs, index, "output")?;
        let addr = lookup_tuple_address(&bx, out_data, out_offsets, index)?;
        info.build_store_ir(&bx, value, addr)?;
    }
    bx.raw().build_return(None)?;
    Ok(entry)
}

/// Compile `function` to native code in `context`.
///
/// The function needs an [`LlvmBuildIrBody`] or a [`TupleCallBody`], and
/// every parameter type needs [`LlvmTypeInfo`].
pub fn compile_function<'ctx>(
    context: &'ctx Context,
    function: &SharedFunction,
    config: &JitConfig,
) -> Result<CompiledFunction<'ctx>, EmitError> {
    tracing::debug!(
        function = function.name(),
        signature = %function.signature(),
        "compile function"
    );

    let ir_body = ir_body_for(function)?;
    let in_meta = function.input_meta()?;
    let out_meta = function.output_meta()?;

    let scx = SimpleCx::new(context, function.name());
    let native = build_body(&scx, function, &*ir_body)?;
    build_tuple_entry(&scx, function, native)?;

    if config.dump_ir {
        eprintln!("=== LLVM IR for {} ===", function.name());
        eprintln!("{}", scx.llmod.print_to_string().to_string());
        eprintln!("=== END IR ===");
    }
    if config.verify {
        scx.llmod
            .verify()
            .map_err(|e| EmitError::Verify(e.to_string()))?;
    }

    Target::initialize_native(&InitializationConfig::default()).map_err(EmitError::Jit)?;
    let engine = scx
        .llmod
        .create_jit_execution_engine(config.opt_level)
        .map_err(|e| EmitError::Jit(e.to_string()))?;
    // SAFETY: the entry was emitted above with exactly this signature
    let entry = unsafe { engine.get_function::<TupleEntryFn>(ENTRY_NAME) }
        .map_err(|e| EmitError::Jit(format!("entry `{ENTRY_NAME}` not found: {e}")))?;

    tracing::debug!(function = function.name(), "function compiled");
    Ok(CompiledFunction {
        entry,
        engine,
        module: scx.llmod,
        function: Rc::clone(function),
        in_meta,
        out_meta,
        _ir_body: ir_body,
    })
}
