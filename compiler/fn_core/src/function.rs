//! Functions: a signature plus a composition of bodies.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::composition::{Composition, Extension};
use crate::error::TupleMetaError;
use crate::signature::Signature;
use crate::tuple::TupleMeta;
use crate::types::SharedType;

/// Shared handle to a [`Function`].
pub type SharedFunction = Rc<Function>;

/// A named unit of computation.
///
/// Bodies are capabilities: the same function may carry a host body
/// ([`TupleCallBody`](crate::TupleCallBody)) and a native-code body at once,
/// and the caller picks whichever execution strategy it supports.
pub struct Function {
    name: String,
    signature: Signature,
    bodies: RefCell<Composition>,
    input_meta: OnceCell<Rc<TupleMeta>>,
    output_meta: OnceCell<Rc<TupleMeta>>,
}

impl Function {
    pub fn new(name: impl Into<String>, signature: Signature) -> SharedFunction {
        Rc::new(Self {
            name: name.into(),
            signature,
            bodies: RefCell::new(Composition::new()),
            input_meta: OnceCell::new(),
            output_meta: OnceCell::new(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Attach a body, replacing one of the same body type.
    pub fn add_body<T: ?Sized + Extension>(&self, body: Rc<T>) {
        tracing::debug!(
            function = %self.name,
            body = T::identifier_in_composition(),
            "add function body"
        );
        self.bodies.borrow_mut().add(body);
    }

    pub fn body<T: ?Sized + Extension>(&self) -> Option<Rc<T>> {
        self.bodies.borrow().get::<T>()
    }

    pub fn has_body<T: ?Sized + Extension>(&self) -> bool {
        self.bodies.borrow().has::<T>()
    }

    /// Identifiers of the attached bodies, for debugging.
    pub fn body_identifiers(&self) -> Vec<&'static str> {
        self.bodies.borrow().identifiers()
    }

    /// Tuple layout of the inputs, computed once.
    pub fn input_meta(&self) -> Result<Rc<TupleMeta>, TupleMetaError> {
        cached_meta(&self.input_meta, || self.signature.input_types())
    }

    /// Tuple layout of the outputs, computed once.
    pub fn output_meta(&self) -> Result<Rc<TupleMeta>, TupleMetaError> {
        cached_meta(&self.output_meta, || self.signature.output_types())
    }
}

fn cached_meta(
    cell: &OnceCell<Rc<TupleMeta>>,
    types: impl FnOnce() -> Vec<SharedType>,
) -> Result<Rc<TupleMeta>, TupleMetaError> {
    if let Some(meta) = cell.get() {
        return Ok(Rc::clone(meta));
    }
    let meta = Rc::new(TupleMeta::new(types())?);
    Ok(Rc::clone(cell.get_or_init(|| meta)))
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &format_args!("{}", self.signature))
            .field("bodies", &self.bodies.borrow())
            .finish()
    }
}
