//! Native lowering metadata for types.
//!
//! [`LlvmTypeInfo`] is the extension a [`Type`](fn_core::Type) carries when
//! its values can be passed to and returned from generated code. A type
//! without it cannot be lowered, which the emission layer reports as
//! [`EmitError::MissingExtension`].
//!
//! Every type with LLVM lowering is plain data: its host representation is
//! bit-copyable and matches `get_type` byte for byte, so generated code may
//! load and store it directly in tuple buffers.

use std::rc::Rc;

use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, PointerValue};

use fn_core::{get_bool_type, get_float3_type, get_float_type, get_int32_type, Extension};

use crate::builder::IrBuilder;
use crate::error::EmitError;

/// How a type is represented in LLVM IR.
pub trait LlvmTypeInfo {
    /// The LLVM type of a value of this type.
    fn get_type<'ctx>(&self, context: &'ctx Context) -> BasicTypeEnum<'ctx>;

    /// Load a value stored in host layout at `byte_addr`.
    fn build_load_ir<'ctx>(
        &self,
        bx: &IrBuilder<'_, 'ctx>,
        byte_addr: PointerValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, EmitError> {
        let ty = self.get_type(bx.llcx());
        Ok(bx.raw().build_load(ty, byte_addr, "value")?)
    }

    /// Store `value` in host layout at `byte_addr`.
    fn build_store_ir<'ctx>(
        &self,
        bx: &IrBuilder<'_, 'ctx>,
        value: BasicValueEnum<'ctx>,
        byte_addr: PointerValue<'ctx>,
    ) -> Result<(), EmitError> {
        bx.raw().build_store(byte_addr, value)?;
        Ok(())
    }
}

impl Extension for dyn LlvmTypeInfo {
    fn identifier_in_composition() -> &'static str {
        "LLVM Type Info"
    }
}

/// Lowering of the built-in plain-data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarLlvmTypeInfo {
    /// `bool` -> i1, stored as one byte (0 or 1)
    Bool,
    /// `i32` -> i32
    Int32,
    /// `f32` -> float
    Float,
    /// `Float3` -> { float, float, float }
    Float3,
}

impl LlvmTypeInfo for ScalarLlvmTypeInfo {
    fn get_type<'ctx>(&self, context: &'ctx Context) -> BasicTypeEnum<'ctx> {
        match self {
            Self::Bool => context.bool_type().into(),
            Self::Int32 => context.i32_type().into(),
            Self::Float => context.f32_type().into(),
            Self::Float3 => {
                let f32_ty: BasicTypeEnum<'ctx> = context.f32_type().into();
                context.struct_type(&[f32_ty, f32_ty, f32_ty], false).into()
            }
        }
    }

    fn build_load_ir<'ctx>(
        &self,
        bx: &IrBuilder<'_, 'ctx>,
        byte_addr: PointerValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, EmitError> {
        if *self != Self::Bool {
            let ty = self.get_type(bx.llcx());
            return Ok(bx.raw().build_load(ty, byte_addr, "value")?);
        }
        let byte = bx
            .raw()
            .build_load(bx.llcx().i8_type(), byte_addr, "bool_byte")?
            .into_int_value();
        let value = bx
            .raw()
            .build_int_truncate(byte, bx.llcx().bool_type(), "bool")?;
        Ok(value.into())
    }

    fn build_store_ir<'ctx>(
        &self,
        bx: &IrBuilder<'_, 'ctx>,
        value: BasicValueEnum<'ctx>,
        byte_addr: PointerValue<'ctx>,
    ) -> Result<(), EmitError> {
        if *self != Self::Bool {
            bx.raw().build_store(byte_addr, value)?;
            return Ok(());
        }
        let byte = bx.raw().build_int_z_extend(
            value.into_int_value(),
            bx.llcx().i8_type(),
            "bool_byte",
        )?;
        bx.raw().build_store(byte_addr, byte)?;
        Ok(())
    }
}

/// Attach LLVM lowering to the built-in plain-data types.
///
/// `String` has no native representation and stays without one. Calling
/// this again replaces the extensions with identical ones.
pub fn register_llvm_types() {
    let scalars = [
        (get_bool_type(), ScalarLlvmTypeInfo::Bool),
        (get_int32_type(), ScalarLlvmTypeInfo::Int32),
        (get_float_type(), ScalarLlvmTypeInfo::Float),
        (get_float3_type(), ScalarLlvmTypeInfo::Float3),
    ];
    for (ty, info) in scalars {
        ty.add_extension::<dyn LlvmTypeInfo>(Rc::new(info));
    }
    tracing::debug!("registered LLVM type infos for built-in types");
}
