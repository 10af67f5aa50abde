//! Fixed-layout heterogeneous records.
//!
//! A [`Tuple`] is the calling convention between function bodies: one flat,
//! aligned byte buffer holding every field at the byte offset recorded in
//! its [`TupleMeta`]. The offsets table is data, not code, so generated
//! native code can address any tuple with a compatible layout through it.
//!
//! Fields are individually initialized. Typed accessors check initialization
//! and the host type at runtime; raw accessors are caller contracts.

#![allow(
    unsafe_code,
    reason = "tuples store type-erased values in a raw aligned buffer"
)]

use std::alloc::{self, Layout};
use std::any::TypeId;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::cpu_type_info::CpuTypeInfo;
use crate::error::TupleMetaError;
use crate::types::SharedType;

/// Layout of a tuple: field types, their host type infos and byte offsets.
pub struct TupleMeta {
    types: Vec<SharedType>,
    type_infos: Vec<Rc<dyn CpuTypeInfo>>,
    offsets: Vec<u32>,
    size_of_data: usize,
    alignment: usize,
    layout: Layout,
}

impl TupleMeta {
    /// Compute the layout for `types`, in order.
    ///
    /// Each field starts at the next offset aligned for its type. The data
    /// size is rounded up to the tuple's alignment (the largest field
    /// alignment), so tuples can be stored back to back.
    pub fn new(types: Vec<SharedType>) -> Result<Self, TupleMetaError> {
        let type_infos = types
            .iter()
            .map(|ty| ty.require_extension::<dyn CpuTypeInfo>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut offsets = Vec::with_capacity(type_infos.len());
        let mut alignment: usize = 1;
        let mut end: usize = 0;
        for info in &type_infos {
            let offset = end.next_multiple_of(info.alignment());
            offsets.push(offset_to_u32(offset)?);
            end = offset + info.size();
            alignment = alignment.max(info.alignment());
        }
        let size_of_data = end.next_multiple_of(alignment);

        // The buffer is never zero-sized; `alloc` requires a non-zero size.
        let layout = Layout::from_size_align(size_of_data.max(1), alignment)?;

        Ok(Self {
            types,
            type_infos,
            offsets,
            size_of_data,
            alignment,
            layout,
        })
    }

    #[inline]
    pub fn types(&self) -> &[SharedType] {
        &self.types
    }

    #[inline]
    pub fn type_infos(&self) -> &[Rc<dyn CpuTypeInfo>] {
        &self.type_infos
    }

    /// Byte offset of every field, in field order.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Total bytes of field data, including trailing padding.
    #[inline]
    pub fn size_of_data(&self) -> usize {
        self.size_of_data
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for TupleMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types.iter().map(|ty| ty.name()).collect();
        f.debug_struct("TupleMeta")
            .field("types", &names)
            .field("offsets", &self.offsets)
            .field("size_of_data", &self.size_of_data)
            .field("alignment", &self.alignment)
            .finish()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "tuple data is bounded far below 4 GiB"
)]
fn offset_to_u32(offset: usize) -> Result<u32, TupleMetaError> {
    u32::try_from(offset).map_err(|_| TupleMetaError::TooLarge { offset })
}

/// A record of typed values laid out according to a [`TupleMeta`].
///
/// Owned by the call site; not shared between concurrent calls.
pub struct Tuple {
    meta: Rc<TupleMeta>,
    data: NonNull<u8>,
    initialized: SmallVec<[bool; 8]>,
}

impl Tuple {
    /// Allocate a tuple with every field uninitialized.
    pub fn new(meta: Rc<TupleMeta>) -> Self {
        // SAFETY: the layout has a non-zero size
        let raw = unsafe { alloc::alloc(meta.layout) };
        let Some(data) = NonNull::new(raw) else {
            alloc::handle_alloc_error(meta.layout)
        };
        let initialized = SmallVec::from_elem(false, meta.len());
        Self {
            meta,
            data,
            initialized,
        }
    }

    #[inline]
    pub fn meta(&self) -> &Rc<TupleMeta> {
        &self.meta
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    #[inline]
    fn element_ptr(&self, index: usize) -> *mut u8 {
        let offset = self.meta.offsets[index] as usize;
        // SAFETY: offsets produced by TupleMeta lie inside the buffer
        unsafe { self.data.as_ptr().add(offset) }
    }

    fn assert_type<T: 'static>(&self, index: usize) {
        assert!(
            self.meta.type_infos[index].host_type_id() == TypeId::of::<T>(),
            "field {index} of type `{}` accessed as `{}`",
            self.meta.types[index].name(),
            std::any::type_name::<T>()
        );
    }

    #[inline]
    pub fn is_initialized(&self, index: usize) -> bool {
        self.initialized[index]
    }

    pub fn all_initialized(&self) -> bool {
        self.initialized.iter().all(|&init| init)
    }

    /// Store `value` in field `index`, dropping the previous value if any.
    pub fn set<T: 'static>(&mut self, index: usize, value: T) {
        self.assert_type::<T>(index);
        let ptr = self.element_ptr(index).cast::<T>();
        if self.initialized[index] {
            // SAFETY: the field holds a live T
            unsafe { *ptr = value };
        } else {
            // SAFETY: the field is aligned for T and uninitialized
            unsafe { ptr.write(value) };
            self.initialized[index] = true;
        }
    }

    /// Borrow field `index`.
    ///
    /// # Panics
    /// Panics if the field is not initialized.
    pub fn get_ref<T: 'static>(&self, index: usize) -> &T {
        self.assert_type::<T>(index);
        assert!(self.initialized[index], "tuple field {index} is not initialized");
        // SAFETY: the field holds a live T for as long as self is borrowed
        unsafe { &*self.element_ptr(index).cast::<T>() }
    }

    /// Clone field `index` out of the tuple.
    pub fn get<T: Clone + 'static>(&self, index: usize) -> T {
        self.get_ref::<T>(index).clone()
    }

    /// Move field `index` out of the tuple, leaving it uninitialized.
    pub fn relocate_out<T: 'static>(&mut self, index: usize) -> T {
        self.assert_type::<T>(index);
        assert!(self.initialized[index], "tuple field {index} is not initialized");
        self.initialized[index] = false;
        // SAFETY: the field holds a live T which is now logically moved out
        unsafe { self.element_ptr(index).cast::<T>().read() }
    }

    /// Write the type's default value into field `index`.
    pub fn init_default(&mut self, index: usize) {
        let info = Rc::clone(&self.meta.type_infos[index]);
        let ptr = self.element_ptr(index);
        // SAFETY: ptr is aligned and valid for the field's type
        unsafe {
            if self.initialized[index] {
                info.destruct(ptr);
            }
            info.construct_default(ptr);
        }
        self.initialized[index] = true;
    }

    /// Write every field's default value.
    ///
    /// Previously initialized fields are destroyed first; afterwards the
    /// whole tuple is initialized.
    pub fn init_default_all(&mut self) {
        for index in 0..self.len() {
            self.init_default(index);
        }
    }

    /// Destroy every initialized field.
    pub fn destruct_all(&mut self) {
        for index in 0..self.len() {
            if self.initialized[index] {
                // SAFETY: the field holds a live value of its type
                unsafe { self.meta.type_infos[index].destruct(self.element_ptr(index)) };
                self.initialized[index] = false;
            }
        }
    }

    /// Clone field `from_index` of `from` into field `to_index` of `to`.
    pub fn copy_element(from: &Tuple, from_index: usize, to: &mut Tuple, to_index: usize) {
        assert!(
            from.meta.type_infos[from_index].host_type_id()
                == to.meta.type_infos[to_index].host_type_id(),
            "copy from field {from_index} of type `{}` into field {to_index} of type `{}`",
            from.meta.types[from_index].name(),
            to.meta.types[to_index].name()
        );
        assert!(
            from.initialized[from_index],
            "tuple field {from_index} is not initialized"
        );
        let info = &to.meta.type_infos[to_index];
        let src = from.element_ptr(from_index);
        let dst = to.element_ptr(to_index);
        // SAFETY: both fields have the same type; src is live
        unsafe {
            if to.initialized[to_index] {
                info.copy_to_initialized(src, dst);
            } else {
                info.copy_to_uninitialized(src, dst);
            }
        }
        to.initialized[to_index] = true;
    }

    /// Clone a value from external memory into field `index`.
    ///
    /// # Safety
    /// `src` must point to a live, properly aligned value of the field's type.
    pub unsafe fn copy_in_raw(&mut self, index: usize, src: *const u8) {
        let info = &self.meta.type_infos[index];
        let dst = self.element_ptr(index);
        // SAFETY: forwarded caller contract; dst is a field of this tuple
        unsafe {
            if self.initialized[index] {
                info.copy_to_initialized(src, dst);
            } else {
                info.copy_to_uninitialized(src, dst);
            }
        }
        self.initialized[index] = true;
    }

    /// Move field `index` into external uninitialized memory.
    ///
    /// # Safety
    /// `dst` must be aligned and valid for the field's type and must not
    /// hold a live value.
    ///
    /// # Panics
    /// Panics if the field is not initialized.
    pub unsafe fn relocate_out_raw(&mut self, index: usize, dst: *mut u8) {
        assert!(self.initialized[index], "tuple field {index} is not initialized");
        let src = self.element_ptr(index);
        // SAFETY: forwarded caller contract; src is live
        unsafe { self.meta.type_infos[index].relocate_to_uninitialized(src, dst) };
        self.initialized[index] = false;
    }

    /// Mark every field as initialized after external code wrote them.
    ///
    /// # Safety
    /// Every field must hold a valid value of its type.
    pub unsafe fn assume_all_initialized(&mut self) {
        self.initialized.iter_mut().for_each(|init| *init = true);
    }

    /// Base address of the field data.
    #[inline]
    pub fn data_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Mutable base address of the field data.
    #[inline]
    pub fn data_ptr_mut(&mut self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Address of the offsets table, one `u32` per field.
    #[inline]
    pub fn offsets_ptr(&self) -> *const u32 {
        self.meta.offsets.as_ptr()
    }
}

impl Drop for Tuple {
    fn drop(&mut self) {
        self.destruct_all();
        // SAFETY: data was allocated in `new` with this layout
        unsafe { alloc::dealloc(self.data.as_ptr(), self.meta.layout) };
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuple")
            .field("meta", &self.meta)
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests;
