//! Capability map shared by types and functions.
//!
//! A [`Composition`] stores at most one value per extension type. Lookup is a
//! typed query: `get::<dyn CpuTypeInfo>()` either yields the stored handle or
//! `None`, so callers decide whether absence is an error.
//!
//! Values are stored as `Rc<T>` and released when the last handle drops.
//! Extension types may be unsized (`dyn Trait`), which is how several
//! concrete implementations share one capability key.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// A capability that can be stored in a [`Composition`].
///
/// Implemented for concrete types or for `dyn Trait` when every
/// implementation of the trait should share one slot.
pub trait Extension: 'static {
    /// Stable, human-readable tag used for debugging and graph introspection.
    fn identifier_in_composition() -> &'static str;
}

struct Entry {
    key: TypeId,
    identifier: &'static str,
    /// Always an `Rc<T>` where `TypeId::of::<T>() == key`.
    value: Box<dyn Any>,
}

/// Typed capability map.
///
/// Compositions are small (a type rarely carries more than a handful of
/// extensions), so entries live inline and lookup is a linear scan.
#[derive(Default)]
pub struct Composition {
    entries: SmallVec<[Entry; 4]>,
}

impl Composition {
    /// Create an empty composition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under its extension type.
    ///
    /// Replaces (and returns) an existing value of the same extension type.
    pub fn add<T: ?Sized + Extension>(&mut self, value: Rc<T>) -> Option<Rc<T>> {
        let key = TypeId::of::<T>();
        let identifier = T::identifier_in_composition();

        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            tracing::debug!(identifier, "replacing extension in composition");
            let previous = std::mem::replace(&mut entry.value, Box::new(value));
            return previous.downcast::<Rc<T>>().ok().map(|boxed| *boxed);
        }

        self.entries.push(Entry {
            key,
            identifier,
            value: Box::new(value),
        });
        None
    }

    /// Look up the value stored for extension type `T`.
    pub fn get<T: ?Sized + Extension>(&self) -> Option<Rc<T>> {
        let key = TypeId::of::<T>();
        self.entries
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.downcast_ref::<Rc<T>>())
            .cloned()
    }

    /// True if a value is stored for extension type `T`.
    pub fn has<T: ?Sized + Extension>(&self) -> bool {
        let key = TypeId::of::<T>();
        self.entries.iter().any(|e| e.key == key)
    }

    /// Remove and return the value stored for extension type `T`.
    ///
    /// Dropping the returned handle releases the value unless other handles
    /// are still alive.
    pub fn remove<T: ?Sized + Extension>(&mut self) -> Option<Rc<T>> {
        let key = TypeId::of::<T>();
        let index = self.entries.iter().position(|e| e.key == key)?;
        let entry = self.entries.remove(index);
        entry.value.downcast::<Rc<T>>().ok().map(|boxed| *boxed)
    }

    /// Identifiers of all stored extensions, in insertion order.
    pub fn identifiers(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.identifier).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.identifiers()).finish()
    }
}

#[cfg(test)]
mod tests;
