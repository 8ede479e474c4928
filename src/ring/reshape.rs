//! Operations that replace the storage block or reorder it wholesale:
//! capacity changes, resizing, assignment, rotation, and linearization.
//!
//! Capacity changes allocate the new block before touching the buffer, so a
//! refused allocation leaves everything as it was. Survivors move bitwise
//! into the new block starting at slot 0; discarded elements are dropped
//! only after the buffer already points at the new block.

use std::mem;

use super::storage::StorageBlock;
use super::{index, CircularBuffer};
use crate::alloc::Allocator;
use crate::error::RingError;

impl<T, A: Allocator + Clone> CircularBuffer<T, A> {
    /// Collects `items` into a buffer whose capacity equals the item count.
    ///
    /// An exact `size_hint` allocates once; otherwise the block doubles as
    /// needed and is trimmed to fit at the end.
    pub fn try_from_iter_in<I>(items: I, alloc: A) -> Result<Self, RingError>
    where
        I: IntoIterator<Item = T>,
    {
        let items = items.into_iter();
        let mut buf = Self::try_with_capacity_in(items.size_hint().0, alloc)?;
        for item in items {
            if buf.is_full() {
                let grown = buf.capacity().saturating_mul(2).max(4);
                buf.set_capacity(grown)?;
            }
            buf.push_back(item);
        }
        buf.set_capacity(buf.len())?;
        Ok(buf)
    }

    /// Changes capacity to exactly `capacity`, keeping the first elements.
    ///
    /// Shrinking below `len` drops the excess from the back. The survivors
    /// end up linearized. Invalidates every position.
    ///
    /// # Errors
    /// [`RingError::CapacityOverflow`] or [`RingError::AllocFailed`]; the
    /// buffer is unchanged in either case.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), RingError> {
        if capacity == self.capacity() {
            return Ok(());
        }
        let keep = self.len.min(capacity);
        self.reallocate(capacity, 0, keep)
    }

    /// Like [`set_capacity`](Self::set_capacity) but keeps the last
    /// elements, dropping the excess from the front.
    pub fn rset_capacity(&mut self, capacity: usize) -> Result<(), RingError> {
        if capacity == self.capacity() {
            return Ok(());
        }
        let keep = self.len.min(capacity);
        self.reallocate(capacity, self.len - keep, keep)
    }

    /// Sets `len` to `n`: grows capacity to `n` if needed and appends clones
    /// of `value`, or drops the excess from the back.
    ///
    /// # Errors
    /// Fails only if growing the capacity fails; the buffer is unchanged.
    /// If `Clone` panics, the clones pushed so far remain.
    pub fn resize(&mut self, n: usize, value: T) -> Result<(), RingError>
    where
        T: Clone,
    {
        if n <= self.len {
            self.erase_end(self.len - n);
            return Ok(());
        }
        self.grow_to(n)?;
        self.fill_back(n - self.len, value);
        Ok(())
    }

    /// Like [`resize`](Self::resize) with values produced by `f`.
    pub fn resize_with<F>(&mut self, n: usize, mut f: F) -> Result<(), RingError>
    where
        F: FnMut() -> T,
    {
        if n <= self.len {
            self.erase_end(self.len - n);
            return Ok(());
        }
        self.grow_to(n)?;
        while self.len < n {
            self.push_back(f());
        }
        Ok(())
    }

    /// Mirror of [`resize`](Self::resize): fills and trims at the front.
    pub fn rresize(&mut self, n: usize, value: T) -> Result<(), RingError>
    where
        T: Clone,
    {
        if n <= self.len {
            self.erase_begin(self.len - n);
            return Ok(());
        }
        self.grow_to(n)?;
        self.fill_front(n - self.len, value);
        Ok(())
    }

    /// Replaces the contents with `n` clones of `value`; capacity becomes
    /// `n`.
    ///
    /// The replacement is built first: on error or a panicking `Clone` the
    /// buffer is unchanged.
    pub fn assign(&mut self, n: usize, value: T) -> Result<(), RingError>
    where
        T: Clone,
    {
        self.assign_with_capacity(n, n, value)
    }

    /// Replaces the contents with `n` clones of `value` in a block of
    /// `capacity` slots.
    ///
    /// # Panics
    /// Panics if `n > capacity`.
    pub fn assign_with_capacity(
        &mut self,
        capacity: usize,
        n: usize,
        value: T,
    ) -> Result<(), RingError>
    where
        T: Clone,
    {
        let fresh = Self::try_from_elem_in(capacity, n, value, self.allocator().clone())?;
        drop(mem::replace(self, fresh));
        Ok(())
    }

    /// Replaces the contents with `items`; capacity becomes the item count.
    pub fn assign_iter<I>(&mut self, items: I) -> Result<(), RingError>
    where
        I: IntoIterator<Item = T>,
    {
        let fresh = Self::try_from_iter_in(items, self.allocator().clone())?;
        drop(mem::replace(self, fresh));
        Ok(())
    }

    /// Replaces the contents with the last `capacity` items of `items`.
    pub fn assign_iter_with_capacity<I>(&mut self, capacity: usize, items: I) -> Result<(), RingError>
    where
        I: IntoIterator<Item = T>,
    {
        let fresh =
            Self::try_from_iter_with_capacity_in(capacity, items, self.allocator().clone())?;
        drop(mem::replace(self, fresh));
        Ok(())
    }

    /// Ensures `capacity >= n` without dropping anything.
    fn grow_to(&mut self, n: usize) -> Result<(), RingError> {
        if n > self.capacity() {
            self.set_capacity(n)?;
        }
        Ok(())
    }

    /// Moves logical `[start, start + keep)` into a fresh block of
    /// `capacity` slots and drops every other element.
    fn reallocate(&mut self, capacity: usize, start: usize, keep: usize) -> Result<(), RingError> {
        debug_assert!(keep <= capacity && start + keep <= self.len);
        let fresh = StorageBlock::try_new(capacity, self.allocator().clone())?;

        let (head, tail) = self.span_runs(start, keep);
        let (front_a, front_b) = self.span_runs(0, start);
        let (back_a, back_b) = self.span_runs(start + keep, self.len - start - keep);
        // SAFETY: the kept runs are live and `fresh` is empty with room for
        // `keep` elements.
        unsafe {
            self.storage.copy_to(head.start, &fresh, 0, head.len());
            self.storage.copy_to(tail.start, &fresh, head.len(), tail.len());
        }

        let old = mem::replace(&mut self.storage, fresh);
        let old_capacity = old.capacity();
        self.first = 0;
        self.len = keep;
        log::trace!(
            "ring storage reallocated: capacity {old_capacity} -> {capacity}, kept {keep}"
        );

        // SAFETY: the discarded runs are still live in `old` and nothing
        // else refers to them.
        unsafe {
            old.destroy_range(front_a);
            old.destroy_range(front_b);
            old.destroy_range(back_a);
            old.destroy_range(back_b);
        }
        Ok(())
    }
}

impl<T, A: Allocator> CircularBuffer<T, A> {
    /// Makes the element at `pos` the new front, preserving cyclic order.
    ///
    /// O(1) when full (only `first` moves); otherwise moves the shorter of
    /// `pos` and `len - pos` elements around the ring. Invalidates every
    /// position.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn rotate(&mut self, pos: usize) {
        assert!(pos <= self.len, "rotate index {pos} out of bounds (len {})", self.len);
        if pos == 0 || pos == self.len {
            return;
        }
        let cap = self.capacity();
        if self.is_full() {
            self.first = self.phys(pos);
            return;
        }
        if pos <= self.len - pos {
            for _ in 0..pos {
                let to = self.phys(self.len);
                // SAFETY: not full, so the slot after the back is free.
                unsafe { self.storage.relocate(self.first, to) };
                self.first = index::increment(self.first, cap);
            }
        } else {
            for _ in 0..self.len - pos {
                let from = self.phys(self.len - 1);
                let to = index::decrement(self.first, cap);
                // SAFETY: not full, so the slot before the front is free.
                unsafe { self.storage.relocate(from, to) };
                self.first = to;
            }
        }
    }

    /// Rearranges storage so the front sits in slot 0 and returns the
    /// elements as one slice. A second call moves nothing.
    ///
    /// Invalidates every position.
    pub fn linearize(&mut self) -> &mut [T] {
        let len = self.len;
        if len == 0 {
            self.first = 0;
        } else if self.first != 0 {
            let cap = self.capacity();
            let first = self.first;
            let head_len = len.min(cap - first);
            let tail_len = len - head_len;
            // SAFETY: every move stays inside the block and only overwrites
            // free slots or slots whose values already moved.
            unsafe {
                if tail_len == 0 {
                    self.storage.copy_within(first, 0, len);
                } else if len == cap {
                    self.storage.slice_mut(0..cap).rotate_left(first);
                } else {
                    self.storage.copy_within(first, tail_len, head_len);
                    self.storage.slice_mut(0..len).rotate_left(tail_len);
                }
            }
            self.first = 0;
        }
        // SAFETY: `[0, len)` is now exactly the live run.
        unsafe { self.storage.slice_mut(0..len) }
    }
}
