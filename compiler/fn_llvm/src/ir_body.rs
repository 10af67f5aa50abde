//! Function bodies that emit LLVM IR directly.

use inkwell::values::BasicValueEnum;

use fn_core::Extension;

use crate::builder::IrBuilder;
use crate::error::EmitError;

/// A body that lowers a function to IR inside a caller-provided function.
///
/// `inputs` holds one value per input parameter, already lowered through
/// the parameter's [`LlvmTypeInfo`](crate::type_info::LlvmTypeInfo). The
/// body returns one value per output parameter, in signature order, and
/// leaves the builder positioned where emission continues.
pub trait LlvmBuildIrBody {
    fn build_ir<'ctx>(
        &self,
        bx: &IrBuilder<'_, 'ctx>,
        inputs: &[BasicValueEnum<'ctx>],
    ) -> Result<Vec<BasicValueEnum<'ctx>>, EmitError>;
}

impl Extension for dyn LlvmBuildIrBody {
    fn identifier_in_composition() -> &'static str {
        "LLVM Build IR Body"
    }
}
