//! Host-memory lowering of types.
//!
//! [`CpuTypeInfo`] is the type-erased vtable a [`Tuple`](crate::Tuple) uses
//! to construct, copy, move and destroy field values in its byte buffer.

#![allow(
    unsafe_code,
    reason = "type-erased construction and destruction of values in raw buffers"
)]

use std::any::TypeId;
use std::marker::PhantomData;
use std::ptr;

use crate::composition::Extension;

/// How values of a type live in host memory.
///
/// # Safety contract
///
/// Every pointer argument must be non-null, aligned to [`alignment`] and
/// valid for [`size`] bytes. "Initialized" pointers must hold a live value of
/// the described type; "uninitialized" pointers must not.
///
/// [`alignment`]: CpuTypeInfo::alignment
/// [`size`]: CpuTypeInfo::size
pub trait CpuTypeInfo {
    /// Size of one value in bytes.
    fn size(&self) -> usize;

    /// Required alignment in bytes (a power of two).
    fn alignment(&self) -> usize;

    /// Identity of the host type, used to check typed tuple access.
    fn host_type_id(&self) -> TypeId;

    /// Write the default value into uninitialized memory.
    unsafe fn construct_default(&self, ptr: *mut u8);

    /// Drop the value in place, leaving the memory uninitialized.
    unsafe fn destruct(&self, ptr: *mut u8);

    /// Clone `src` over the live value at `dst`.
    unsafe fn copy_to_initialized(&self, src: *const u8, dst: *mut u8);

    /// Clone `src` into uninitialized memory at `dst`.
    unsafe fn copy_to_uninitialized(&self, src: *const u8, dst: *mut u8);

    /// Move `src` over the live value at `dst`; `src` becomes uninitialized.
    unsafe fn relocate_to_initialized(&self, src: *mut u8, dst: *mut u8);

    /// Move `src` into uninitialized memory at `dst`; `src` becomes uninitialized.
    unsafe fn relocate_to_uninitialized(&self, src: *mut u8, dst: *mut u8);
}

impl Extension for dyn CpuTypeInfo {
    fn identifier_in_composition() -> &'static str {
        "CPU Type Info"
    }
}

/// [`CpuTypeInfo`] for any host type with a default value.
pub struct CpuTypeInfoForType<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> CpuTypeInfoForType<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for CpuTypeInfoForType<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(
    clippy::cast_ptr_alignment,
    reason = "callers guarantee pointers are aligned for T"
)]
impl<T: Default + Clone + 'static> CpuTypeInfo for CpuTypeInfoForType<T> {
    #[inline]
    fn size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    #[inline]
    fn alignment(&self) -> usize {
        std::mem::align_of::<T>()
    }

    #[inline]
    fn host_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    unsafe fn construct_default(&self, ptr: *mut u8) {
        // SAFETY: caller guarantees ptr is aligned, valid and uninitialized
        unsafe { ptr.cast::<T>().write(T::default()) }
    }

    unsafe fn destruct(&self, ptr: *mut u8) {
        // SAFETY: caller guarantees ptr holds a live T
        unsafe { ptr::drop_in_place(ptr.cast::<T>()) }
    }

    unsafe fn copy_to_initialized(&self, src: *const u8, dst: *mut u8) {
        // SAFETY: both hold live values of T; assignment drops the old dst value
        unsafe { *dst.cast::<T>() = (*src.cast::<T>()).clone() }
    }

    unsafe fn copy_to_uninitialized(&self, src: *const u8, dst: *mut u8) {
        // SAFETY: src holds a live T, dst is valid uninitialized memory
        unsafe { dst.cast::<T>().write((*src.cast::<T>()).clone()) }
    }

    unsafe fn relocate_to_initialized(&self, src: *mut u8, dst: *mut u8) {
        // SAFETY: src is read exactly once and then treated as uninitialized
        unsafe { *dst.cast::<T>() = src.cast::<T>().read() }
    }

    unsafe fn relocate_to_uninitialized(&self, src: *mut u8, dst: *mut u8) {
        // SAFETY: src is read exactly once and then treated as uninitialized
        unsafe { dst.cast::<T>().write(src.cast::<T>().read()) }
    }
}
