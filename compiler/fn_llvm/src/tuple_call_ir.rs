//! Calling host tuple bodies from generated code.
//!
//! A function that only has a [`TupleCallBody`] can still take part in
//! native code: [`TupleCallIrBody`] stages the IR argument values in a stack
//! buffer laid out like the function's input tuple, calls back into the host
//! through a trampoline and loads the results from a second buffer laid out
//! like the output tuple.

use std::ffi::c_void;
use std::rc::Rc;

use inkwell::values::BasicValueEnum;

use fn_core::{
    call_in_frame, ExecutionContext, SharedFunction, Tuple, TupleCallBody, TupleMeta,
    TupleMetaError,
};

use crate::builder::IrBuilder;
use crate::error::EmitError;
use crate::ir_body::LlvmBuildIrBody;
use crate::ir_utils::{
    alloca_bytes, call_pointer, int_ptr_to_ir, lookup_tuple_address, void_ptr_to_ir,
};
use crate::type_info::LlvmTypeInfo;

/// Host state a generated call site points at.
struct TupleCallInvocation {
    name: String,
    body: Rc<dyn TupleCallBody>,
    in_meta: Rc<TupleMeta>,
    out_meta: Rc<TupleMeta>,
}

/// Entry point generated code calls with the staged buffers.
///
/// Runs in a fresh [`ExecutionContext`]; the native caller has no context
/// to pass along. Outputs the host body left uninitialized receive their
/// type's default value. A panic in the host body cannot unwind through
/// generated code and aborts the process.
extern "C" fn run_tuple_call_body(
    invocation: *const TupleCallInvocation,
    in_data: *const u8,
    out_data: *mut u8,
) {
    // SAFETY: `invocation` is the boxed invocation of a live TupleCallIrBody
    let invocation = unsafe { &*invocation };

    let mut fn_in = Tuple::new(Rc::clone(&invocation.in_meta));
    for (index, &offset) in invocation.in_meta.offsets().iter().enumerate() {
        // SAFETY: generated code stored a valid value of each field's type at
        // its aligned offset in the input buffer
        unsafe { fn_in.copy_in_raw(index, in_data.add(offset as usize)) };
    }

    let mut fn_out = Tuple::new(Rc::clone(&invocation.out_meta));
    let mut ctx = ExecutionContext::new();
    call_in_frame(
        &*invocation.body,
        &invocation.name,
        &mut fn_in,
        &mut fn_out,
        &mut ctx,
    );

    for index in 0..fn_out.len() {
        if !fn_out.is_initialized(index) {
            tracing::error!(
                function = %invocation.name,
                index,
                "host body left output uninitialized, using default"
            );
            fn_out.init_default(index);
        }
    }

    for (index, &offset) in invocation.out_meta.offsets().iter().enumerate() {
        // SAFETY: the output buffer has the output tuple's layout and holds
        // no live values; every field is plain data
        unsafe { fn_out.relocate_out_raw(index, out_data.add(offset as usize)) };
    }
}

/// IR body that forwards to a function's host [`TupleCallBody`].
pub struct TupleCallIrBody {
    /// Boxed so its address stays fixed while generated code refers to it.
    invocation: Box<TupleCallInvocation>,
    input_infos: Vec<Rc<dyn LlvmTypeInfo>>,
    output_infos: Vec<Rc<dyn LlvmTypeInfo>>,
}

impl TupleCallIrBody {
    /// Wrap the tuple call body of `function`.
    ///
    /// Every parameter type needs LLVM lowering, since values cross the
    /// boundary through the tuple buffers.
    pub fn new(function: &SharedFunction) -> Result<Self, EmitError> {
        let body = function
            .body::<dyn TupleCallBody>()
            .ok_or_else(|| EmitError::MissingBody {
                function: function.name().to_string(),
            })?;
        let signature = function.signature();
        let input_infos = signature.input_extensions::<dyn LlvmTypeInfo>()?;
        let output_infos = signature.output_extensions::<dyn LlvmTypeInfo>()?;

        Ok(Self {
            invocation: Box::new(TupleCallInvocation {
                name: function.name().to_string(),
                body,
                in_meta: function.input_meta()?,
                out_meta: function.output_meta()?,
            }),
            input_infos,
            output_infos,
        })
    }

    /// Name of the wrapped function.
    pub fn name(&self) -> &str {
        &self.invocation.name
    }
}

impl LlvmBuildIrBody for TupleCallIrBody {
    fn build_ir<'ctx>(
        &self,
        bx: &IrBuilder<'_, 'ctx>,
        inputs: &[BasicValueEnum<'ctx>],
    ) -> Result<Vec<BasicValueEnum<'ctx>>, EmitError> {
        build_tuple_call_body_ir(bx, self, inputs)
    }
}

fn buffer_size(meta: &TupleMeta) -> Result<u32, EmitError> {
    let size = meta.size_of_data();
    u32::try_from(size).map_err(|_| TupleMetaError::TooLarge { offset: size }.into())
}

/// Emit a call from generated code into the host body of `body`.
///
/// Inputs are stored into an aligned stack buffer at the input tuple's
/// offsets, the trampoline runs the host body and the outputs are loaded
/// back from a second buffer in output order.
pub fn build_tuple_call_body_ir<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    body: &TupleCallIrBody,
    inputs: &[BasicValueEnum<'ctx>],
) -> Result<Vec<BasicValueEnum<'ctx>>, EmitError> {
    let invocation = &*body.invocation;
    if inputs.len() != body.input_infos.len() {
        return Err(EmitError::Instruction(format!(
            "`{}` called with {} arguments, signature declares {}",
            invocation.name,
            inputs.len(),
            body.input_infos.len()
        )));
    }
    tracing::trace!(function = %invocation.name, "emit tuple call");

    let in_data = alloca_bytes(bx, buffer_size(&invocation.in_meta)?)?;
    let out_data = alloca_bytes(bx, buffer_size(&invocation.out_meta)?)?;
    let in_offsets = int_ptr_to_ir(bx, invocation.in_meta.offsets().as_ptr())?;
    let out_offsets = int_ptr_to_ir(bx, invocation.out_meta.offsets().as_ptr())?;

    for (index, (info, &value)) in (0u32..).zip(body.input_infos.iter().zip(inputs)) {
        let addr = lookup_tuple_address(bx, in_data, in_offsets, index)?;
        info.build_store_ir(bx, value, addr)?;
    }

    let ptr_ty = bx.scx().type_ptr();
    let trampoline_type = bx
        .scx()
        .type_void_func(&[ptr_ty.into(), ptr_ty.into(), ptr_ty.into()]);
    let invocation_ptr = void_ptr_to_ir(bx, std::ptr::from_ref(invocation).cast::<c_void>())?;
    let trampoline: extern "C" fn(*const TupleCallInvocation, *const u8, *mut u8) =
        run_tuple_call_body;
    call_pointer(
        bx,
        trampoline as *const c_void,
        trampoline_type,
        &[invocation_ptr.into(), in_data.into(), out_data.into()],
    )?;

    let mut outputs = Vec::with_capacity(body.output_infos.len());
    for (index, info) in (0u32..).zip(&body.output_infos) {
        let addr = lookup_tuple_address(bx, out_data, out_offsets, index)?;
        outputs.push(info.build_load_ir(bx, addr)?);
    }
    Ok(outputs)
}
