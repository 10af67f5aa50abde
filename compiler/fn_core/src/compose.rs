//! Sequential composition of functions.

use std::rc::Rc;

use crate::error::CompositionError;
use crate::function::{Function, SharedFunction};
use crate::signature::Signature;
use crate::tuple::{Tuple, TupleMeta};
use crate::tuple_call::{call_in_frame, ExecutionContext, TupleCallBody};

/// Runs `first`, feeds its outputs to `second`.
struct SequenceBody {
    first: SharedFunction,
    first_body: Rc<dyn TupleCallBody>,
    second: SharedFunction,
    second_body: Rc<dyn TupleCallBody>,
    middle_meta: Rc<TupleMeta>,
}

impl TupleCallBody for SequenceBody {
    fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple, ctx: &mut ExecutionContext) {
        let mut middle = Tuple::new(Rc::clone(&self.middle_meta));
        call_in_frame(&*self.first_body, self.first.name(), fn_in, &mut middle, ctx);
        call_in_frame(&*self.second_body, self.second.name(), &mut middle, fn_out, ctx);
    }

    fn init_defaults(&self, fn_in: &mut Tuple) {
        self.first_body.init_defaults(fn_in);
    }
}

fn tuple_call_body(function: &Function) -> Result<Rc<dyn TupleCallBody>, CompositionError> {
    function
        .body::<dyn TupleCallBody>()
        .ok_or_else(|| CompositionError::MissingBody {
            function: function.name().to_string(),
        })
}

/// Build `name` = `second ∘ first`.
///
/// The result takes `first`'s inputs and produces `second`'s outputs. The
/// outputs of `first` must be exactly the inputs of `second` (same count,
/// same types in the same order).
pub fn compose_sequence(
    name: impl Into<String>,
    first: &SharedFunction,
    second: &SharedFunction,
) -> Result<SharedFunction, CompositionError> {
    let first_body = tuple_call_body(first)?;
    let second_body = tuple_call_body(second)?;

    let outputs = first.signature().outputs();
    let inputs = second.signature().inputs();
    if outputs.len() != inputs.len() {
        return Err(CompositionError::ArityMismatch {
            first: first.name().to_string(),
            outputs: outputs.len(),
            second: second.name().to_string(),
            inputs: inputs.len(),
        });
    }
    for (index, (output, input)) in outputs.iter().zip(inputs).enumerate() {
        if !Rc::ptr_eq(output.ty(), input.ty()) {
            return Err(CompositionError::TypeMismatch {
                index,
                expected: input.ty().name().to_string(),
                found: output.ty().name().to_string(),
            });
        }
    }

    let signature = Signature::new(
        first.signature().inputs().to_vec(),
        second.signature().outputs().to_vec(),
    );
    let middle_meta = first.output_meta()?;

    let function = Function::new(name, signature);
    tracing::debug!(
        function = function.name(),
        first = first.name(),
        second = second.name(),
        "compose sequence"
    );
    function.add_body::<dyn TupleCallBody>(Rc::new(SequenceBody {
        first: Rc::clone(first),
        first_body,
        second: Rc::clone(second),
        second_body,
        middle_meta,
    }));
    Ok(function)
}
