//! Owned block of uninitialised slots obtained from an [`Allocator`].
//!
//! The block knows raw slot offsets only: it has no notion of which slots are
//! live, of `first`, or of wraparound. The buffer above it tracks that.
//!
//! # Invariants
//! - `cap` is fixed for the lifetime of the block; changing capacity means
//!   allocating a new block and moving elements across.
//! - Zero-capacity blocks and blocks of zero-sized `T` use a dangling pointer
//!   and never touch the allocator.
//! - Dropping a block releases memory only. Live elements must have been
//!   dropped or moved out by the owner beforehand.

use std::alloc::Layout;
use std::marker::PhantomData;
use std::mem::{needs_drop, size_of};
use std::ops::Range;
use std::ptr::{self, NonNull};
use std::slice;

use crate::alloc::Allocator;
use crate::error::RingError;

/// Fixed-size slot array backing one ring buffer.
pub(crate) struct StorageBlock<T, A: Allocator> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

// SAFETY: the block owns its slots like a `Box<[MaybeUninit<T>]>` would.
unsafe impl<T: Send, A: Allocator + Send> Send for StorageBlock<T, A> {}
// SAFETY: shared access only hands out `&T` through the owning buffer.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for StorageBlock<T, A> {}

impl<T, A: Allocator> StorageBlock<T, A> {
    /// A block with no slots. Never allocates.
    pub(crate) fn empty(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Allocates a block of exactly `cap` slots.
    ///
    /// Fails without allocating when `cap` exceeds the allocator's
    /// `max_size`, and reports the layout when the allocator refuses.
    pub(crate) fn try_new(cap: usize, alloc: A) -> Result<Self, RingError> {
        let max = alloc.max_size::<T>();
        if cap > max {
            return Err(RingError::CapacityOverflow {
                requested: cap,
                max,
            });
        }
        if cap == 0 {
            return Ok(Self::empty(alloc));
        }
        if size_of::<T>() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                cap,
                alloc,
                _owns: PhantomData,
            });
        }

        let layout = Layout::array::<T>(cap).map_err(|_| RingError::CapacityOverflow {
            requested: cap,
            max,
        })?;
        let raw = alloc
            .allocate(layout)
            .map_err(|_| RingError::AllocFailed {
                size: layout.size(),
                align: layout.align(),
            })?;

        Ok(Self {
            ptr: raw.cast::<T>(),
            cap,
            alloc,
            _owns: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Raw pointer to slot `i`.
    #[inline]
    pub(crate) fn slot(&self, i: usize) -> *mut T {
        debug_assert!(i < self.cap, "slot {i} out of bounds (cap {})", self.cap);
        // SAFETY: `i < cap`, so the offset stays inside the allocation (or is
        // a no-op for zero-sized `T`).
        unsafe { self.ptr.as_ptr().add(i) }
    }

    /// Constructs `value` in slot `i`.
    ///
    /// # Safety
    /// Slot `i` must be uninitialised.
    #[inline]
    pub(crate) unsafe fn write(&self, i: usize, value: T) {
        // SAFETY: `slot(i)` is in bounds and uninitialised per the caller.
        unsafe { self.alloc.construct(self.slot(i), value) }
    }

    /// Moves the value out of slot `i`, leaving it uninitialised.
    ///
    /// # Safety
    /// Slot `i` must be initialised and is logically uninitialised afterwards.
    #[inline]
    pub(crate) unsafe fn read(&self, i: usize) -> T {
        // SAFETY: guaranteed by the caller.
        unsafe { ptr::read(self.slot(i)) }
    }

    /// Drops the value in slot `i`.
    ///
    /// # Safety
    /// Slot `i` must be initialised and is uninitialised afterwards.
    #[inline]
    pub(crate) unsafe fn destroy(&self, i: usize) {
        // SAFETY: guaranteed by the caller.
        unsafe { self.alloc.destroy(self.slot(i)) }
    }

    /// Drops every value in the physical `range` through the allocator's
    /// `destroy` hook, in slot order.
    ///
    /// Skipped entirely for types without drop glue. If one destructor
    /// panics the rest of the range is still dropped.
    ///
    /// # Safety
    /// Every slot in `range` must be initialised and is uninitialised
    /// afterwards.
    pub(crate) unsafe fn destroy_range(&self, range: Range<usize>) {
        if !needs_drop::<T>() || range.is_empty() {
            return;
        }
        debug_assert!(range.end <= self.cap);

        /// Finishes the range if a destructor unwinds.
        struct Rest<'b, T, A: Allocator> {
            block: &'b StorageBlock<T, A>,
            next: usize,
            end: usize,
        }

        impl<T, A: Allocator> Drop for Rest<'_, T, A> {
            fn drop(&mut self) {
                while self.next < self.end {
                    let i = self.next;
                    self.next += 1;
                    // SAFETY: slots past `next` are still live per the caller.
                    unsafe { self.block.destroy(i) };
                }
            }
        }

        let mut rest = Rest {
            block: self,
            next: range.start,
            end: range.end,
        };
        while rest.next < rest.end {
            let i = rest.next;
            rest.next += 1;
            // SAFETY: in bounds and initialised per the caller; `next` has
            // already moved past `i`, so an unwind never revisits it.
            unsafe { self.destroy(i) };
        }
    }

    /// Bitwise-moves slot `from` into slot `to` (distinct slots).
    ///
    /// # Safety
    /// `from` must be initialised and `to` uninitialised; afterwards the
    /// roles are swapped.
    #[inline]
    pub(crate) unsafe fn relocate(&self, from: usize, to: usize) {
        debug_assert!(from != to);
        // SAFETY: both slots are in bounds and distinct.
        unsafe { ptr::copy_nonoverlapping(self.slot(from), self.slot(to), 1) }
    }

    /// Bitwise-moves `count` slots starting at `src` to `dst`; the ranges may
    /// overlap but must not wrap.
    ///
    /// # Safety
    /// Source slots must be initialised; destination slots outside the source
    /// range must be uninitialised.
    #[inline]
    pub(crate) unsafe fn copy_within(&self, src: usize, dst: usize, count: usize) {
        if count == 0 {
            return;
        }
        debug_assert!(src + count <= self.cap && dst + count <= self.cap);
        // SAFETY: both ranges are in bounds; `ptr::copy` handles overlap.
        unsafe { ptr::copy(self.slot(src), self.slot(dst), count) }
    }

    /// Bitwise-moves `count` slots starting at `src` into `dst` of another
    /// block, starting at `dst_start`.
    ///
    /// # Safety
    /// Source slots must be initialised and destination slots uninitialised.
    #[inline]
    pub(crate) unsafe fn copy_to(
        &self,
        src: usize,
        dst: &StorageBlock<T, A>,
        dst_start: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        debug_assert!(src + count <= self.cap && dst_start + count <= dst.cap);
        // SAFETY: distinct allocations never overlap.
        unsafe { ptr::copy_nonoverlapping(self.slot(src), dst.slot(dst_start), count) }
    }

    /// Shared view of the physical `range`.
    ///
    /// # Safety
    /// Every slot in `range` must be initialised.
    #[inline]
    pub(crate) unsafe fn slice(&self, range: Range<usize>) -> &[T] {
        debug_assert!(range.end <= self.cap || range.is_empty());
        // SAFETY: in bounds and initialised per the caller.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr().add(range.start), range.len()) }
    }

    /// Mutable view of the physical `range`.
    ///
    /// # Safety
    /// Every slot in `range` must be initialised.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slice_mut(&self, range: Range<usize>) -> &mut [T] {
        debug_assert!(range.end <= self.cap || range.is_empty());
        // SAFETY: in bounds and initialised per the caller; the owning buffer
        // holds `&mut self` while the slice is alive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr().add(range.start), range.len()) }
    }
}

impl<T, A: Allocator> Drop for StorageBlock<T, A> {
    fn drop(&mut self) {
        if self.cap == 0 || size_of::<T>() == 0 {
            return;
        }
        // The layout was valid when the block was allocated.
        if let Ok(layout) = Layout::array::<T>(self.cap) {
            // SAFETY: `ptr` came from `allocate` with this layout.
            unsafe { self.alloc.deallocate(self.ptr.cast::<u8>(), layout) };
        }
    }
}
