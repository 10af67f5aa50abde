//! Primitives for generated code that works on host memory.
//!
//! Generated code reaches host objects (tuple buffers, offset tables, host
//! functions) through addresses that are known at emission time. Those
//! addresses are embedded as 64-bit integer constants and converted to
//! pointers in IR. The module is only valid for as long as every embedded
//! address stays alive; callers keep the owners around (see
//! [`CompiledFunction`](crate::compile::CompiledFunction)).

use std::ffi::c_void;
use std::rc::Rc;

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum, FunctionType, PointerType, StructType};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, CallSiteValue, IntValue, PointerValue,
};
use smallvec::SmallVec;

use fn_core::Signature;

use crate::builder::IrBuilder;
use crate::error::EmitError;
use crate::type_info::LlvmTypeInfo;

/// LLVM types of a parameter list.
pub type LlvmTypes<'ctx> = SmallVec<[BasicTypeEnum<'ctx>; 8]>;

/// Alignment of stack buffers created by [`alloca_bytes`]. Large enough for
/// every plain-data type with LLVM lowering.
pub const ALLOCA_ALIGNMENT: u32 = 16;

/// Embed `address` as an `i64` constant.
fn address_to_ir<'ctx>(bx: &IrBuilder<'_, 'ctx>, address: *const c_void) -> IntValue<'ctx> {
    bx.scx().type_i64().const_int(address as usize as u64, false)
}

/// Emit an indirect call to the host function at `pointer`.
///
/// `function_type` must match the host function's ABI. The call has no
/// name when the function returns void.
pub fn call_pointer<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    pointer: *const c_void,
    function_type: FunctionType<'ctx>,
    arguments: &[BasicValueEnum<'ctx>],
) -> Result<CallSiteValue<'ctx>, EmitError> {
    let address = address_to_ir(bx, pointer);
    let callee = bx
        .raw()
        .build_int_to_ptr(address, bx.scx().type_ptr(), "fn_ptr")?;
    let arguments: SmallVec<[BasicMetadataValueEnum<'ctx>; 8]> =
        arguments.iter().map(|&value| value.into()).collect();
    let name = if function_type.get_return_type().is_some() {
        "call"
    } else {
        ""
    };
    Ok(bx
        .raw()
        .build_indirect_call(function_type, callee, &arguments, name)?)
}

/// Address of field `index` of a tuple: `data_addr + offsets_addr[index]`.
///
/// `offsets_addr` points to a `u32` table with an entry for `index`; the
/// resulting pointer addresses a byte inside the tuple buffer.
pub fn lookup_tuple_address<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    data_addr: PointerValue<'ctx>,
    offsets_addr: PointerValue<'ctx>,
    index: u32,
) -> Result<PointerValue<'ctx>, EmitError> {
    let i32_ty = bx.scx().type_i32();
    let index = i32_ty.const_int(u64::from(index), false);
    // SAFETY: the offsets table has an entry for every field index
    let offset_addr =
        unsafe { bx.raw().build_in_bounds_gep(i32_ty, offsets_addr, &[index], "offset_addr")? };
    let offset = bx
        .raw()
        .build_load(i32_ty, offset_addr, "offset")?
        .into_int_value();
    let offset = bx
        .raw()
        .build_int_z_extend(offset, bx.scx().type_i64(), "offset_i64")?;
    // SAFETY: every offset lies inside the tuple buffer
    let value_addr =
        unsafe { bx.raw().build_gep(bx.scx().type_i8(), data_addr, &[offset], "value_byte_addr")? };
    Ok(value_addr)
}

/// Embed a host address as a pointer of type `ty`.
pub fn ptr_to_ir<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    ptr: *const c_void,
    ty: PointerType<'ctx>,
) -> Result<PointerValue<'ctx>, EmitError> {
    let address = address_to_ir(bx, ptr);
    Ok(bx.raw().build_int_to_ptr(address, ty, "host_ptr")?)
}

/// Embed an untyped host address.
pub fn void_ptr_to_ir<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    ptr: *const c_void,
) -> Result<PointerValue<'ctx>, EmitError> {
    ptr_to_ir(bx, ptr, bx.scx().type_ptr())
}

/// Embed the address of a `u32` table, such as tuple offsets.
pub fn int_ptr_to_ir<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    ptr: *const u32,
) -> Result<PointerValue<'ctx>, EmitError> {
    ptr_to_ir(bx, ptr.cast(), bx.scx().type_ptr())
}

/// Embed the address of a byte buffer.
pub fn byte_ptr_to_ir<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    ptr: *const u8,
) -> Result<PointerValue<'ctx>, EmitError> {
    ptr_to_ir(bx, ptr.cast(), bx.scx().type_ptr())
}

/// Reserve `size` bytes on the stack of the current function.
///
/// The `alloca` is placed at the top of the function's entry block, so a
/// buffer requested inside a loop is allocated once per call, not once per
/// iteration. The builder's own position is left unchanged. The buffer is
/// aligned to [`ALLOCA_ALIGNMENT`] so any lowered value can be stored at an
/// aligned offset inside it.
pub fn alloca_bytes<'ctx>(
    bx: &IrBuilder<'_, 'ctx>,
    size: u32,
) -> Result<PointerValue<'ctx>, EmitError> {
    let entry = bx
        .raw()
        .get_insert_block()
        .and_then(|block| block.get_parent())
        .and_then(|function| function.get_first_basic_block())
        .ok_or_else(|| {
            EmitError::Instruction("stack buffer requested outside a function".to_string())
        })?;
    let entry_bx = bx.llcx().create_builder();
    match entry.get_first_instruction() {
        Some(first) => entry_bx.position_before(&first),
        None => entry_bx.position_at_end(entry),
    }

    let array_type = bx.scx().type_i8().array_type(size);
    let buffer = entry_bx.build_alloca(array_type, "bytes")?;
    if let Some(instruction) = buffer.as_instruction_value() {
        instruction
            .set_alignment(ALLOCA_ALIGNMENT)
            .map_err(|e| EmitError::Instruction(e.to_string()))?;
    }
    Ok(buffer)
}

/// LLVM types of `values`, in order.
pub fn types_of_values<'ctx>(values: &[BasicValueEnum<'ctx>]) -> LlvmTypes<'ctx> {
    values.iter().map(|value| value.get_type()).collect()
}

/// LLVM types described by `type_infos`, in order.
pub fn types_of_type_infos<'ctx>(
    type_infos: &[Rc<dyn LlvmTypeInfo>],
    context: &'ctx Context,
) -> LlvmTypes<'ctx> {
    type_infos.iter().map(|info| info.get_type(context)).collect()
}

/// The aggregate returned by a function with `signature`: an anonymous
/// struct with one field per output, in order.
pub fn output_struct_type<'ctx>(
    signature: &Signature,
    context: &'ctx Context,
) -> Result<StructType<'ctx>, EmitError> {
    let output_infos = signature.output_extensions::<dyn LlvmTypeInfo>()?;
    let output_types = types_of_type_infos(&output_infos, context);
    Ok(context.struct_type(&output_types, false))
}

/// Native function type for `signature`.
///
/// One parameter per input, lowered through its [`LlvmTypeInfo`]; the
/// return is the [`output_struct_type`] even for zero or one outputs.
pub fn function_type_from_signature<'ctx>(
    signature: &Signature,
    context: &'ctx Context,
) -> Result<FunctionType<'ctx>, EmitError> {
    let input_infos = signature.input_extensions::<dyn LlvmTypeInfo>()?;
    let input_types: SmallVec<[BasicMetadataTypeEnum<'ctx>; 8]> = input_infos
        .iter()
        .map(|info| info.get_type(context).into())
        .collect();
    let return_type = output_struct_type(signature, context)?;
    Ok(return_type.fn_type(&input_types, false))
}
