//! Test modules for LLVM emission and JIT compilation.
//!
//! Every test creates its own `Context`. Generated code is verified and
//! executed through an MCJIT engine.

#![allow(clippy::unwrap_used, reason = "tests fail loudly on setup errors")]


pub mod helper {
    use std::rc::Rc;

    use inkwell::execution_engine::ExecutionEngine;
    use inkwell::targets::{InitializationConfig, Target};
    use inkwell::values::{BasicValueEnum, FunctionValue};
    use inkwell::OptimizationLevel;

    use fn_core::{
        get_int32_type, ExecutionContext, Function, InputParameter, OutputParameter,
        SharedFunction, SharedType, Signature, Tuple, TupleCallBody,
    };

    use crate::builder::IrBuilder;
    use crate::context::SimpleCx;
    use crate::error::EmitError;
    use crate::ir_body::LlvmBuildIrBody;
    use crate::type_info::register_llvm_types;

    /// Attach LLVM lowering to the built-in types of this test thread.
    pub fn setup() {
        register_llvm_types();
    }

    /// Verify the module and create a JIT engine for it.
    pub fn jit<'ll>(scx: &SimpleCx<'ll>) -> ExecutionEngine<'ll> {
        Target::initialize_native(&InitializationConfig::default()).unwrap();
        if let Err(e) = scx.llmod.verify() {
            panic!(
                "invalid module: {e}\n{}",
                scx.llmod.print_to_string().to_string()
            );
        }
        scx.llmod
            .create_jit_execution_engine(OptimizationLevel::None)
            .unwrap()
    }

    /// Builder positioned in the entry block of `function`.
    pub fn entry_builder<'scx, 'll>(
        scx: &'scx SimpleCx<'ll>,
        function: FunctionValue<'ll>,
    ) -> IrBuilder<'scx, 'll> {
        let bx = IrBuilder::new(scx);
        bx.start_block(function, "entry");
        bx
    }

    /// Function with the given parameter types and no bodies.
    pub fn function(
        name: &str,
        inputs: &[(&str, SharedType)],
        outputs: &[(&str, SharedType)],
    ) -> SharedFunction {
        Function::new(
            name,
            Signature::new(
                inputs
                    .iter()
                    .map(|(name, ty)| InputParameter::new(*name, Rc::clone(ty)))
                    .collect(),
                outputs
                    .iter()
                    .map(|(name, ty)| OutputParameter::new(*name, Rc::clone(ty)))
                    .collect(),
            ),
        )
    }

    /// `(a: Int32, b: Int32) -> (sum: Int32)` without bodies.
    pub fn int32_binary(name: &str) -> SharedFunction {
        function(
            name,
            &[("a", get_int32_type()), ("b", get_int32_type())],
            &[("sum", get_int32_type())],
        )
    }

    /// IR body adding its two integer inputs.
    pub struct AddIr;

    impl LlvmBuildIrBody for AddIr {
        fn build_ir<'ctx>(
            &self,
            bx: &IrBuilder<'_, 'ctx>,
            inputs: &[BasicValueEnum<'ctx>],
        ) -> Result<Vec<BasicValueEnum<'ctx>>, EmitError> {
            let sum = bx.raw().build_int_add(
                inputs[0].into_int_value(),
                inputs[1].into_int_value(),
                "sum",
            )?;
            Ok(vec![sum.into()])
        }
    }

    /// Host body adding its two integer inputs.
    pub struct HostAdd;

    impl TupleCallBody for HostAdd {
        fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple, _ctx: &mut ExecutionContext) {
            fn_out.set(0, fn_in.get::<i32>(0) + fn_in.get::<i32>(1));
        }
    }

    /// Input and output tuples for `function`.
    pub fn tuples(function: &SharedFunction) -> (Tuple, Tuple) {
        (
            Tuple::new(function.input_meta().unwrap()),
            Tuple::new(function.output_meta().unwrap()),
        )
    }
}
