//! Minimal LLVM context shared by emission code.
//!
//! `SimpleCx` bundles the LLVM context, the module being built and the
//! handful of types every emitter needs. It carries no function-backend
//! state, so type lowering and the address primitives can work with it
//! directly.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{
    BasicMetadataTypeEnum, BasicTypeEnum, FloatType, FunctionType, IntType, PointerType,
    StructType, VoidType,
};
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

/// LLVM context, module and commonly used types.
pub struct SimpleCx<'ll> {
    /// The LLVM context (owns all LLVM types and values).
    pub llcx: &'ll Context,
    /// The LLVM module being compiled.
    pub llmod: Module<'ll>,
    /// Opaque pointer type. With opaque pointers every pointer type
    /// (`void*`, `i32*`, `i8*`) lowers to this.
    pub ptr_type: PointerType<'ll>,
}

impl<'ll> SimpleCx<'ll> {
    /// Create a context with a fresh module.
    #[must_use]
    pub fn new(context: &'ll Context, module_name: &str) -> Self {
        let llmod = context.create_module(module_name);
        let ptr_type = context.ptr_type(AddressSpace::default());
        Self {
            llcx: context,
            llmod,
            ptr_type,
        }
    }

    // -- Type constructors --

    #[inline]
    pub fn type_i1(&self) -> IntType<'ll> {
        self.llcx.bool_type()
    }

    #[inline]
    pub fn type_i8(&self) -> IntType<'ll> {
        self.llcx.i8_type()
    }

    #[inline]
    pub fn type_i32(&self) -> IntType<'ll> {
        self.llcx.i32_type()
    }

    #[inline]
    pub fn type_i64(&self) -> IntType<'ll> {
        self.llcx.i64_type()
    }

    #[inline]
    pub fn type_f32(&self) -> FloatType<'ll> {
        self.llcx.f32_type()
    }

    #[inline]
    pub fn type_void(&self) -> VoidType<'ll> {
        self.llcx.void_type()
    }

    #[inline]
    pub fn type_ptr(&self) -> PointerType<'ll> {
        self.ptr_type
    }

    /// Create an anonymous struct type from fields.
    pub fn type_struct(&self, fields: &[BasicTypeEnum<'ll>], packed: bool) -> StructType<'ll> {
        self.llcx.struct_type(fields, packed)
    }

    /// Create a void function type.
    pub fn type_void_func(&self, args: &[BasicMetadataTypeEnum<'ll>]) -> FunctionType<'ll> {
        self.type_void().fn_type(args, false)
    }

    /// Add an externally visible function to the module.
    pub fn declare_fn(&self, name: &str, ty: FunctionType<'ll>) -> FunctionValue<'ll> {
        self.llmod.add_function(name, ty, None)
    }
}
