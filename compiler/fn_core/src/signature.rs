//! Function signatures: ordered, named input and output types.

use std::fmt;
use std::rc::Rc;

use crate::composition::Extension;
use crate::error::MissingExtension;
use crate::types::SharedType;

/// A named function input.
#[derive(Clone, Debug)]
pub struct InputParameter {
    name: String,
    ty: SharedType,
}

impl InputParameter {
    pub fn new(name: impl Into<String>, ty: SharedType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &SharedType {
        &self.ty
    }
}

/// A named function output.
#[derive(Clone, Debug)]
pub struct OutputParameter {
    name: String,
    ty: SharedType,
}

impl OutputParameter {
    pub fn new(name: impl Into<String>, ty: SharedType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &SharedType {
        &self.ty
    }
}

/// Interface of a function, independent of how it executes.
///
/// Immutable once constructed. Input and output order is the tuple field
/// order and the native parameter/aggregate field order.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    inputs: Vec<InputParameter>,
    outputs: Vec<OutputParameter>,
}

impl Signature {
    pub fn new(inputs: Vec<InputParameter>, outputs: Vec<OutputParameter>) -> Self {
        Self { inputs, outputs }
    }

    #[inline]
    pub fn inputs(&self) -> &[InputParameter] {
        &self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> &[OutputParameter] {
        &self.outputs
    }

    pub fn input_types(&self) -> Vec<SharedType> {
        self.inputs.iter().map(|p| Rc::clone(&p.ty)).collect()
    }

    pub fn output_types(&self) -> Vec<SharedType> {
        self.outputs.iter().map(|p| Rc::clone(&p.ty)).collect()
    }

    /// Extension `T` of every input type, in input order.
    ///
    /// Fails with the first input type that lacks the extension.
    pub fn input_extensions<T: ?Sized + Extension>(&self) -> Result<Vec<Rc<T>>, MissingExtension> {
        self.inputs
            .iter()
            .map(|p| p.ty.require_extension::<T>())
            .collect()
    }

    /// Extension `T` of every output type, in output order.
    pub fn output_extensions<T: ?Sized + Extension>(
        &self,
    ) -> Result<Vec<Rc<T>>, MissingExtension> {
        self.outputs
            .iter()
            .map(|p| p.ty.require_extension::<T>())
            .collect()
    }

    /// True if the input and output types are exactly `inputs` and `outputs`.
    pub fn has_interface(&self, inputs: &[SharedType], outputs: &[SharedType]) -> bool {
        fn same<'a>(
            params: impl ExactSizeIterator<Item = &'a SharedType>,
            types: &[SharedType],
        ) -> bool {
            params.len() == types.len() && params.zip(types).all(|(a, b)| Rc::ptr_eq(a, b))
        }
        same(self.inputs.iter().map(InputParameter::ty), inputs)
            && same(self.outputs.iter().map(OutputParameter::ty), outputs)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", p.name, p.ty)?;
        }
        f.write_str(") -> (")?;
        for (i, p) in self.outputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", p.name, p.ty)?;
        }
        f.write_str(")")
    }
}
