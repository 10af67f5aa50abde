//! Runtime type descriptors.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::composition::{Composition, Extension};
use crate::error::MissingExtension;

/// Shared handle to a [`Type`]. Type identity is `Rc` pointer identity.
pub type SharedType = Rc<Type>;

/// A runtime type: a display name plus a composition of extensions.
///
/// Extensions describe how the type is lowered to a target (host memory,
/// LLVM IR, ...). They are added after construction, so a crate that knows
/// a new target can extend the built-in types without the core knowing it.
pub struct Type {
    name: String,
    extensions: RefCell<Composition>,
}

impl Type {
    /// Create a type without extensions.
    pub fn new(name: impl Into<String>) -> SharedType {
        Rc::new(Self {
            name: name.into(),
            extensions: RefCell::new(Composition::new()),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach an extension, replacing one of the same extension type.
    pub fn add_extension<T: ?Sized + Extension>(&self, extension: Rc<T>) {
        tracing::trace!(
            type_name = %self.name,
            extension = T::identifier_in_composition(),
            "add type extension"
        );
        self.extensions.borrow_mut().add(extension);
    }

    /// Look up an extension.
    pub fn extension<T: ?Sized + Extension>(&self) -> Option<Rc<T>> {
        self.extensions.borrow().get::<T>()
    }

    pub fn has_extension<T: ?Sized + Extension>(&self) -> bool {
        self.extensions.borrow().has::<T>()
    }

    /// Look up an extension, reporting its absence as an error.
    pub fn require_extension<T: ?Sized + Extension>(&self) -> Result<Rc<T>, MissingExtension> {
        self.extension::<T>().ok_or_else(|| MissingExtension {
            type_name: self.name.clone(),
            extension: T::identifier_in_composition(),
        })
    }

    /// Identifiers of the attached extensions, for debugging.
    pub fn extension_identifiers(&self) -> Vec<&'static str> {
        self.extensions.borrow().identifiers()
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("name", &self.name)
            .field("extensions", &self.extensions.borrow())
            .finish()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
