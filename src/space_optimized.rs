//! Ring buffer whose storage grows and shrinks with its contents.
//!
//! [`SpaceOptimized`] behaves exactly like a [`CircularBuffer`] of capacity
//! `control.capacity()`: the same overwrite rule, the same positions, the
//! same results. Only the *internal* block differs. It starts at
//! `min_capacity`, grows geometrically when an insertion needs room, and
//! shrinks by halving once the buffer is at most a third full.
//!
//! # Invariants
//! - `min_capacity <= internal capacity <= control.capacity()`.
//! - Growth leaves at least a fifth of the new block free (unless capped
//!   by `control.capacity()`).
//! - Shrinking never drops elements; it only moves them into a smaller
//!   block. A refused shrink allocation is logged and ignored.
//!
//! Operations that may grow the block return `Result`, since they can hit
//! an allocation failure where the fixed buffer could not.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut, RangeBounds};

use crate::alloc::{Allocator, Global};
use crate::error::RingError;
use crate::ring::{or_alloc_panic, CircularBuffer, Cursor, Iter, IterMut};

/// Capacity bounds for a [`SpaceOptimized`] buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CapacityControl {
    capacity: usize,
    min_capacity: usize,
}

impl CapacityControl {
    /// # Errors
    /// [`RingError::InvalidCapacityControl`] if `min_capacity > capacity`.
    pub fn new(capacity: usize, min_capacity: usize) -> Result<Self, RingError> {
        if min_capacity > capacity {
            return Err(RingError::InvalidCapacityControl {
                capacity,
                min_capacity,
            });
        }
        Ok(Self {
            capacity,
            min_capacity,
        })
    }

    /// Logical capacity: the most elements the buffer holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Internal storage never shrinks below this.
    #[inline]
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    /// Internal capacity for `len` elements when the block currently holds
    /// `current` slots and may need to shrink.
    fn fitted(&self, current: usize, len: usize) -> usize {
        if self.min_capacity > current {
            return self.min_capacity;
        }
        let mut cap = current;
        // `/ 3` keeps push/pop at a boundary from oscillating.
        while cap / 3 >= len {
            cap /= 2;
            if cap <= self.min_capacity {
                cap = self.min_capacity;
                break;
            }
        }
        self.with_headroom(cap, len)
    }

    /// Doubles `cap` if less than a fifth of it would be free, then clamps
    /// to the logical capacity.
    fn with_headroom(&self, cap: usize, len: usize) -> usize {
        let cap = if len.saturating_add(cap / 5) >= cap {
            cap.saturating_mul(2)
        } else {
            cap
        };
        cap.min(self.capacity)
    }
}

impl From<usize> for CapacityControl {
    /// Logical capacity `capacity`, no minimum.
    fn from(capacity: usize) -> Self {
        Self {
            capacity,
            min_capacity: 0,
        }
    }
}

/// [`CircularBuffer`] adaptor that allocates only what its contents need.
///
/// # Example
///
/// ```
/// use circular_rs::{CapacityControl, SpaceOptimized};
///
/// let control = CapacityControl::new(1000, 2).unwrap();
/// let mut buf = SpaceOptimized::new(control).unwrap();
/// assert_eq!(buf.internal_capacity(), 2);
///
/// for i in 0..10 {
///     buf.push_back(i).unwrap();
/// }
/// assert_eq!(buf.capacity(), 1000);
/// assert!(buf.internal_capacity() < 1000);
///
/// buf.erase_begin(9);
/// assert!(buf.internal_capacity() <= 4);
/// ```
pub struct SpaceOptimized<T, A: Allocator + Clone = Global> {
    buf: CircularBuffer<T, A>,
    control: CapacityControl,
}

impl<T> SpaceOptimized<T, Global> {
    /// Creates an empty buffer with `min_capacity` slots preallocated.
    pub fn new(control: CapacityControl) -> Result<Self, RingError> {
        Self::new_in(control, Global)
    }

    /// Logical capacity `capacity`, no minimum, nothing allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: CircularBuffer::new(),
            control: CapacityControl::from(capacity),
        }
    }

    /// `n` clones of `value` (`n <= control.capacity()`).
    pub fn from_elem(control: CapacityControl, n: usize, value: T) -> Result<Self, RingError>
    where
        T: Clone,
    {
        Self::from_elem_in(control, n, value, Global)
    }

    /// The last `control.capacity()` items of `items`.
    pub fn from_iter_with_control<I>(control: CapacityControl, items: I) -> Result<Self, RingError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_iter_with_control_in(control, items, Global)
    }
}

impl<T, A: Allocator + Clone> SpaceOptimized<T, A> {
    /// Creates an empty buffer in `alloc` with `min_capacity` slots
    /// preallocated.
    ///
    /// # Errors
    /// [`RingError::CapacityOverflow`] if `min_capacity` exceeds the
    /// allocator's `max_size`; [`RingError::AllocFailed`] if `alloc`
    /// refuses the block.
    pub fn new_in(control: CapacityControl, alloc: A) -> Result<Self, RingError> {
        Ok(Self {
            buf: CircularBuffer::try_with_capacity_in(control.min_capacity, alloc)?,
            control,
        })
    }

    /// # Panics
    /// Panics if `n > control.capacity()`.
    pub fn from_elem_in(
        control: CapacityControl,
        n: usize,
        value: T,
        alloc: A,
    ) -> Result<Self, RingError>
    where
        T: Clone,
    {
        assert!(
            n <= control.capacity,
            "element count {n} exceeds capacity {}",
            control.capacity
        );
        let internal = n.max(control.min_capacity);
        Ok(Self {
            buf: CircularBuffer::try_from_elem_in(internal, n, value, alloc)?,
            control,
        })
    }

    pub fn from_iter_with_control_in<I>(
        control: CapacityControl,
        items: I,
        alloc: A,
    ) -> Result<Self, RingError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut out = Self::new_in(control, alloc)?;
        for item in items {
            out.push_back(item)?;
        }
        Ok(out)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// True at the logical capacity, regardless of the internal block.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.control.capacity
    }

    /// Logical capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.control.capacity
    }

    /// Slots currently allocated.
    #[inline]
    pub fn internal_capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn reserve(&self) -> usize {
        self.control.capacity - self.buf.len()
    }

    #[inline]
    pub fn control(&self) -> CapacityControl {
        self.control
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.buf.max_size()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// The underlying fixed buffer.
    #[inline]
    pub fn as_ring(&self) -> &CircularBuffer<T, A> {
        &self.buf
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.buf.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.buf.get_mut(index)
    }

    pub fn at(&self, index: usize) -> Result<&T, RingError> {
        self.buf.at(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, RingError> {
        self.buf.at_mut(index)
    }

    pub fn front(&self) -> Option<&T> {
        self.buf.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.buf.front_mut()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.buf.back_mut()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.buf.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.buf.iter_mut()
    }

    pub fn as_slices(&self) -> (&[T], &[T]) {
        self.buf.as_slices()
    }

    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        self.buf.as_mut_slices()
    }

    pub fn begin(&self) -> Cursor<'_, T, A> {
        self.buf.begin()
    }

    pub fn end(&self) -> Cursor<'_, T, A> {
        self.buf.end()
    }

    pub fn cursor(&self, index: usize) -> Cursor<'_, T, A> {
        self.buf.cursor(index)
    }

    pub fn is_linearized(&self) -> bool {
        self.buf.is_linearized()
    }

    pub fn linearize(&mut self) -> &mut [T] {
        self.buf.linearize()
    }

    pub fn rotate(&mut self, pos: usize) {
        self.buf.rotate(pos);
    }

    /// Appends `value`, growing the block if needed; overwrites the front
    /// once at logical capacity.
    ///
    /// # Errors
    /// Fails only when growth is refused. `value` is dropped and the buffer
    /// is unchanged.
    pub fn push_back(&mut self, value: T) -> Result<(), RingError> {
        if !self.is_full() {
            self.ensure_room(1)?;
        }
        self.buf.push_back(value);
        Ok(())
    }

    pub fn push_front(&mut self, value: T) -> Result<(), RingError> {
        if !self.is_full() {
            self.ensure_room(1)?;
        }
        self.buf.push_front(value);
        Ok(())
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let value = self.buf.pop_back();
        self.shrink_if_sparse();
        value
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let value = self.buf.pop_front();
        self.shrink_if_sparse();
        value
    }

    /// See [`CircularBuffer::insert`].
    pub fn insert(&mut self, pos: usize, value: T) -> Result<usize, RingError> {
        if !self.is_full() {
            self.ensure_room(1)?;
        }
        Ok(self.buf.insert(pos, value))
    }

    /// See [`CircularBuffer::rinsert`].
    pub fn rinsert(&mut self, pos: usize, value: T) -> Result<usize, RingError> {
        if !self.is_full() {
            self.ensure_room(1)?;
        }
        Ok(self.buf.rinsert(pos, value))
    }

    pub fn insert_n(&mut self, pos: usize, n: usize, value: &T) -> Result<usize, RingError>
    where
        T: Clone,
    {
        self.check_pos(pos);
        self.ensure_room(n.min(pos + self.reserve()))?;
        Ok(self.buf.insert_n(pos, n, value))
    }

    pub fn rinsert_n(&mut self, pos: usize, n: usize, value: &T) -> Result<usize, RingError>
    where
        T: Clone,
    {
        self.check_pos(pos);
        self.ensure_room(n.min(self.len() - pos + self.reserve()))?;
        Ok(self.buf.rinsert_n(pos, n, value))
    }

    /// See [`CircularBuffer::insert_iter`]. Exact-size input grows the block
    /// once; other input grows it as items arrive.
    pub fn insert_iter<I>(&mut self, pos: usize, items: I) -> Result<usize, RingError>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_pos(pos);
        let limit = pos + self.reserve();
        if limit == 0 {
            return Ok(pos);
        }
        let items = items.into_iter();
        match items.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                self.ensure_room(lower.min(limit))?;
                Ok(self.buf.insert_iter(pos, items))
            }
            _ => {
                let mut at = pos;
                for item in items {
                    at = self.insert(at, item)? + 1;
                }
                Ok(at)
            }
        }
    }

    /// See [`CircularBuffer::rinsert_iter`].
    pub fn rinsert_iter<I>(&mut self, pos: usize, items: I) -> Result<usize, RingError>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_pos(pos);
        let limit = self.len() - pos + self.reserve();
        if limit == 0 {
            return Ok(pos);
        }
        let items = items.into_iter().take(limit);
        match items.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                self.ensure_room(lower)?;
                Ok(self.buf.rinsert_iter(pos, items))
            }
            _ => {
                let mut at = pos;
                for item in items {
                    at = self.rinsert(at, item)? + 1;
                }
                Ok(at)
            }
        }
    }

    pub fn erase(&mut self, pos: usize) -> usize {
        let at = self.buf.erase(pos);
        self.shrink_if_sparse();
        at
    }

    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let at = self.buf.erase_range(range);
        self.shrink_if_sparse();
        at
    }

    pub fn rerase(&mut self, pos: usize) -> usize {
        let at = self.buf.rerase(pos);
        self.shrink_if_sparse();
        at
    }

    pub fn rerase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let at = self.buf.rerase_range(range);
        self.shrink_if_sparse();
        at
    }

    pub fn erase_begin(&mut self, n: usize) {
        self.buf.erase_begin(n);
        self.shrink_if_sparse();
    }

    pub fn erase_end(&mut self, n: usize) {
        self.buf.erase_end(n);
        self.shrink_if_sparse();
    }

    pub fn remove(&mut self, pos: usize) -> Option<T> {
        let value = self.buf.remove(pos);
        self.shrink_if_sparse();
        value
    }

    /// Drops every element and shrinks the block towards `min_capacity`.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.shrink_if_sparse();
    }

    /// Replaces the capacity bounds, dropping elements past the new
    /// logical capacity from the back.
    ///
    /// # Errors
    /// The buffer and its bounds are unchanged if reallocation fails.
    pub fn set_capacity(&mut self, control: CapacityControl) -> Result<(), RingError> {
        let keep = self.len().min(control.capacity);
        let target = control.fitted(self.buf.capacity(), keep);
        self.buf.set_capacity(target)?;
        self.control = control;
        Ok(())
    }

    /// Like [`set_capacity`](Self::set_capacity) but drops the excess from
    /// the front.
    pub fn rset_capacity(&mut self, control: CapacityControl) -> Result<(), RingError> {
        let keep = self.len().min(control.capacity);
        let target = control.fitted(self.buf.capacity(), keep);
        self.buf.rset_capacity(target)?;
        self.control = control;
        Ok(())
    }

    /// Sets `len` to `n`, appending clones of `value` or dropping from the
    /// back. Raises the logical capacity to `n` if needed.
    pub fn resize(&mut self, n: usize, value: T) -> Result<(), RingError>
    where
        T: Clone,
    {
        let len = self.len();
        if n <= len {
            self.erase_end(len - n);
            return Ok(());
        }
        self.grow_for_resize(n)?;
        self.buf.resize(n, value)
    }

    /// Like [`resize`](Self::resize) with values produced by `f`.
    pub fn resize_with<F>(&mut self, n: usize, f: F) -> Result<(), RingError>
    where
        F: FnMut() -> T,
    {
        let len = self.len();
        if n <= len {
            self.erase_end(len - n);
            return Ok(());
        }
        self.grow_for_resize(n)?;
        self.buf.resize_with(n, f)
    }

    /// Keeps the first `len` elements, releasing storage once sparse.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
        self.shrink_if_sparse();
    }

    /// Mirror of [`resize`](Self::resize) at the front.
    pub fn rresize(&mut self, n: usize, value: T) -> Result<(), RingError>
    where
        T: Clone,
    {
        let len = self.len();
        if n <= len {
            self.erase_begin(len - n);
            return Ok(());
        }
        self.grow_for_resize(n)?;
        self.buf.rresize(n, value)
    }

    /// `n` clones of `value`; bounds become `(n, 0)`.
    pub fn assign(&mut self, n: usize, value: T) -> Result<(), RingError>
    where
        T: Clone,
    {
        self.buf.assign(n, value)?;
        self.control = CapacityControl::from(n);
        Ok(())
    }

    /// `n` clones of `value` under new bounds.
    ///
    /// # Panics
    /// Panics if `n > control.capacity()`.
    pub fn assign_with_control(
        &mut self,
        control: CapacityControl,
        n: usize,
        value: T,
    ) -> Result<(), RingError>
    where
        T: Clone,
    {
        let fresh = Self::from_elem_in(control, n, value, self.allocator().clone())?;
        *self = fresh;
        Ok(())
    }

    /// Every item of `items`; bounds become `(count, 0)`.
    pub fn assign_iter<I>(&mut self, items: I) -> Result<(), RingError>
    where
        I: IntoIterator<Item = T>,
    {
        self.buf.assign_iter(items)?;
        self.control = CapacityControl::from(self.buf.len());
        Ok(())
    }

    /// The last `control.capacity()` items of `items` under new bounds.
    pub fn assign_iter_with_control<I>(
        &mut self,
        control: CapacityControl,
        items: I,
    ) -> Result<(), RingError>
    where
        I: IntoIterator<Item = T>,
    {
        let fresh = Self::from_iter_with_control_in(control, items, self.allocator().clone())?;
        *self = fresh;
        Ok(())
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Asserts the internal-capacity bounds on top of the ring invariants.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        self.buf.check_invariants();
        let internal = self.buf.capacity();
        assert!(
            internal <= self.control.capacity,
            "internal capacity {internal} exceeds logical {}",
            self.control.capacity
        );
        assert!(
            internal >= self.control.min_capacity,
            "internal capacity {internal} below minimum {}",
            self.control.min_capacity
        );
    }

    /// Grows the block so `n` more elements fit without eviction, up to the
    /// logical capacity.
    fn ensure_room(&mut self, n: usize) -> Result<(), RingError> {
        let current = self.buf.capacity();
        let needed = self.buf.len().saturating_add(n);
        if needed <= current {
            return Ok(());
        }
        let mut cap = current.max(1);
        while needed > cap {
            cap = cap.saturating_mul(2);
        }
        let target = self.control.with_headroom(cap, needed);
        if target == current {
            return Ok(());
        }
        log::debug!("space-optimized buffer growing: {current} -> {target} slots");
        self.buf.set_capacity(target)
    }

    /// Halves the block while it is at most a third full, stopping at
    /// `min_capacity`.
    fn shrink_if_sparse(&mut self) {
        let current = self.buf.capacity();
        let target = self.control.fitted(current, self.buf.len());
        if target >= current {
            return;
        }
        match self.buf.set_capacity(target) {
            Ok(()) => log::debug!("space-optimized buffer shrinking: {current} -> {target} slots"),
            Err(err) => log::debug!("space-optimized shrink to {target} skipped: {err}"),
        }
    }

    fn grow_for_resize(&mut self, n: usize) -> Result<(), RingError> {
        let previous = self.control;
        if n > self.control.capacity {
            self.control.capacity = n;
        }
        let result = self.ensure_room(n - self.len());
        if result.is_err() {
            self.control = previous;
        }
        result
    }

    #[inline]
    fn check_pos(&self, pos: usize) {
        assert!(
            pos <= self.len(),
            "insertion index {pos} out of bounds (len {})",
            self.len()
        );
    }
}

impl<T> Default for SpaceOptimized<T, Global> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for SpaceOptimized<T, A> {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            control: self.control,
        }
    }
}

impl<T: fmt::Debug, A: Allocator + Clone> fmt::Debug for SpaceOptimized<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceOptimized")
            .field("items", &self.buf)
            .field("capacity", &self.control.capacity)
            .field("internal_capacity", &self.buf.capacity())
            .finish()
    }
}

impl<T: PartialEq, A: Allocator + Clone> PartialEq for SpaceOptimized<T, A> {
    /// Compares elements only.
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

impl<T: Eq, A: Allocator + Clone> Eq for SpaceOptimized<T, A> {}

impl<T, U, A: Allocator + Clone> PartialEq<[U]> for SpaceOptimized<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.buf == *other
    }
}

impl<T, U, A: Allocator + Clone, const N: usize> PartialEq<[U; N]> for SpaceOptimized<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.buf == *other
    }
}

impl<T: PartialOrd, A: Allocator + Clone> PartialOrd for SpaceOptimized<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.buf.partial_cmp(&other.buf)
    }
}

impl<T: Ord, A: Allocator + Clone> Ord for SpaceOptimized<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.buf.cmp(&other.buf)
    }
}

impl<T: Hash, A: Allocator + Clone> Hash for SpaceOptimized<T, A> {
    /// Hashes like a [`CircularBuffer`] with the same elements.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.buf.hash(state);
    }
}

impl<T, A: Allocator + Clone> Index<usize> for SpaceOptimized<T, A> {
    type Output = T;

    /// # Panics
    /// Panics if `index >= len`.
    fn index(&self, index: usize) -> &T {
        &self.buf[index]
    }
}

impl<T, A: Allocator + Clone> IndexMut<usize> for SpaceOptimized<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.buf[index]
    }
}

impl<T, A: Allocator + Clone> Extend<T> for SpaceOptimized<T, A> {
    /// # Panics
    /// Panics (or aborts through `handle_alloc_error`) if growth fails.
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            or_alloc_panic(self.push_back(item));
        }
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a SpaceOptimized<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a mut SpaceOptimized<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A: Allocator + Clone> IntoIterator for SpaceOptimized<T, A> {
    type Item = T;
    type IntoIter = crate::ring::IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.buf.into_iter()
    }
}

#[cfg(test)]
#[path = "space_optimized_tests.rs"]
mod space_optimized_tests;
