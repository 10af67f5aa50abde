//! Instruction builder handle passed to every emission call.

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::values::FunctionValue;

use crate::context::SimpleCx;

/// An inkwell [`Builder`] paired with the [`SimpleCx`] it emits into.
///
/// Two lifetimes:
/// - `'ctx`: the LLVM context lifetime (from `Context::create()`).
/// - `'scx`: the borrow lifetime of the `SimpleCx` reference.
///
/// Not thread-safe; the thread that owns the context owns its builders.
pub struct IrBuilder<'scx, 'ctx> {
    builder: Builder<'ctx>,
    scx: &'scx SimpleCx<'ctx>,
}

impl<'scx, 'ctx> IrBuilder<'scx, 'ctx> {
    pub fn new(scx: &'scx SimpleCx<'ctx>) -> Self {
        Self {
            builder: scx.llcx.create_builder(),
            scx,
        }
    }

    /// Create a builder positioned at the end of `block`.
    pub fn at_end(scx: &'scx SimpleCx<'ctx>, block: BasicBlock<'ctx>) -> Self {
        let bx = Self::new(scx);
        bx.position_at_end(block);
        bx
    }

    #[inline]
    pub fn scx(&self) -> &'scx SimpleCx<'ctx> {
        self.scx
    }

    #[inline]
    pub fn llcx(&self) -> &'ctx Context {
        self.scx.llcx
    }

    /// The underlying inkwell builder, for instructions without a helper.
    #[inline]
    pub fn raw(&self) -> &Builder<'ctx> {
        &self.builder
    }

    pub fn position_at_end(&self, block: BasicBlock<'ctx>) {
        self.builder.position_at_end(block);
    }

    /// Append a block to `function` and position at its end.
    pub fn start_block(&self, function: FunctionValue<'ctx>, name: &str) -> BasicBlock<'ctx> {
        let block = self.scx.llcx.append_basic_block(function, name);
        self.builder.position_at_end(block);
        block
    }
}
