//! Allocator capability consumed by the ring buffer storage.
//!
//! The buffer never talks to `std::alloc` directly. It asks an [`Allocator`]
//! for raw slots, constructs and destroys elements through it, and consults
//! [`Allocator::max_size`] before every capacity request so that an
//! oversized request fails with an error instead of a partial allocation.
//!
//! # Invariants
//! - `allocate` is never called with a zero-sized layout; zero-sized
//!   storage uses a dangling pointer and is never deallocated.
//! - Every pointer returned by `allocate` is passed back to `deallocate`
//!   exactly once, with the same layout.

use std::alloc::{alloc, dealloc, Layout};
use std::mem::size_of;
use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// Memory capability used by [`CircularBuffer`](crate::CircularBuffer).
///
/// # Safety
///
/// Implementors must return memory that is valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not aliased by any
/// other live allocation until it is passed to `deallocate`. Clones of an
/// allocator must be able to free each other's allocations.
pub unsafe trait Allocator {
    /// Allocates a block for `layout`. `layout.size()` is never zero.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Releases a block previously returned by `allocate`.
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this allocator (or a clone) with
    /// the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Constructs `value` in the uninitialised slot at `slot`.
    ///
    /// # Safety
    /// `slot` must be valid for writes and must not hold a live value.
    #[inline]
    unsafe fn construct<T>(&self, slot: *mut T, value: T) {
        // SAFETY: guaranteed by the caller.
        unsafe { ptr::write(slot, value) }
    }

    /// Drops the live value at `slot`, leaving it uninitialised.
    ///
    /// # Safety
    /// `slot` must hold a live value that is not used afterwards.
    #[inline]
    unsafe fn destroy<T>(&self, slot: *mut T) {
        // SAFETY: guaranteed by the caller.
        unsafe { ptr::drop_in_place(slot) }
    }

    /// Largest element count this allocator can provide for `T`.
    #[inline]
    fn max_size<T>(&self) -> usize {
        match size_of::<T>() {
            0 => usize::MAX,
            size => isize::MAX as usize / size,
        }
    }
}

/// The global heap, via `std::alloc`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

// SAFETY: forwards to the global allocator, which upholds the contract.
unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() > 0, "zero-sized allocation request");
        // SAFETY: layout has non-zero size (checked by callers).
        let raw = unsafe { alloc(layout) };
        NonNull::new(raw).ok_or(AllocError)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: guaranteed by the caller.
        unsafe { dealloc(ptr.as_ptr(), layout) }
    }
}
