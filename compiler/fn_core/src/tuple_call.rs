//! Host execution of functions over tuples.

use std::fmt;

use crate::composition::Extension;
use crate::tuple::Tuple;

/// A function body that runs on the host, reading an input tuple and
/// writing an output tuple.
///
/// Implementations must initialize every output field and must not keep
/// mutable state between calls unless they document otherwise.
pub trait TupleCallBody {
    /// Execute the body.
    ///
    /// `fn_in` is fully initialized and matches the function's input
    /// layout; `fn_out` matches its output layout.
    fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple, ctx: &mut ExecutionContext);

    /// Fill `fn_in` with default inputs.
    ///
    /// The default writes each type's default value; bodies with
    /// domain-specific defaults override this.
    fn init_defaults(&self, fn_in: &mut Tuple) {
        fn_in.init_default_all();
    }
}

impl Extension for dyn TupleCallBody {
    fn identifier_in_composition() -> &'static str {
        "Tuple Call Body"
    }
}

/// Stack of named frames describing nested calls, for diagnostics.
#[derive(Clone, Debug, Default)]
pub struct ExecutionStack {
    frames: Vec<String>,
}

impl ExecutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: impl Into<String>) {
        self.frames.push(frame.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop()
    }

    #[inline]
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for ExecutionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            f.write_str(frame)?;
        }
        Ok(())
    }
}

/// Per-evaluation state threaded through nested body calls.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    stack: ExecutionStack,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stack(&self) -> &ExecutionStack {
        &self.stack
    }

    #[inline]
    pub fn stack_mut(&mut self) -> &mut ExecutionStack {
        &mut self.stack
    }
}

/// Call `body` with a frame named `frame` pushed for the duration.
pub fn call_in_frame(
    body: &dyn TupleCallBody,
    frame: &str,
    fn_in: &mut Tuple,
    fn_out: &mut Tuple,
    ctx: &mut ExecutionContext,
) {
    ctx.stack_mut().push(frame);
    tracing::trace!(stack = %ctx.stack(), "call tuple body");
    body.call(fn_in, fn_out, ctx);
    ctx.stack_mut().pop();
}
