//! Bounded ring buffer with random-access positions and overwrite-on-full
//! semantics.
//!
//! # Invariants
//! - `len <= capacity`.
//! - The `len` live elements occupy the physical slots starting at `first`,
//!   wrapping modulo `capacity`; every other slot is uninitialised.
//! - `first < capacity` whenever `capacity > 0`; `first == 0` otherwise.
//!
//! # Overwrite rule
//! Pushing or inserting at one end of a full buffer drops the element at the
//! opposite end and reuses its slot. Length stays at capacity and nothing is
//! allocated. A zero-capacity buffer drops every pushed value.
//!
//! # Positions
//! Positional operations take and return logical indices (`0..=len`). A
//! [`Cursor`] is a borrowed position; it converts with [`Cursor::index`] and
//! [`CircularBuffer::cursor`]. The borrow checker rules out using a cursor
//! across a mutation, so "invalidation" below describes which positions
//! change meaning, not memory hazards.
//!
//! # Panic safety
//! Element moves are bitwise and cannot fail. The only user code that runs
//! mid-operation is `Clone`, `Drop`, and caller iterators; each operation
//! documents what survives if that code panics. The buffer is always left
//! valid and droppable.
//!
//! # Threading
//! Not synchronized. `Send`/`Sync` follow `T` and the allocator.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut, Range};

use crate::alloc::{Allocator, Global};
use crate::error::RingError;

mod cursor;
mod erase;
mod index;
mod insert;
mod iter;
mod reshape;
mod storage;


pub use cursor::Cursor;
pub use iter::{IntoIter, Iter, IterMut};

use storage::StorageBlock;

/// Fixed-capacity ring buffer over allocator-provided storage.
///
/// # Example
///
/// ```
/// use circular_rs::CircularBuffer;
///
/// let mut buf = CircularBuffer::with_capacity(3);
/// for i in 1..=4 {
///     buf.push_back(i);
/// }
/// assert_eq!(buf, [2, 3, 4]);
///
/// buf.push_back(5);
/// assert_eq!(buf, [3, 4, 5]);
/// assert!(buf.is_full());
/// ```
pub struct CircularBuffer<T, A: Allocator = Global> {
    storage: StorageBlock<T, A>,
    /// Physical slot of the logical front.
    first: usize,
    /// Number of live elements.
    len: usize,
}

impl<T> CircularBuffer<T, Global> {
    /// Creates an empty buffer with capacity 0. Never allocates.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty buffer holding up to `capacity` elements.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds [`max_size`](Self::max_size); aborts
    /// through `handle_alloc_error` if the allocation fails. Use
    /// [`try_with_capacity`](Self::try_with_capacity) to get an error instead.
    pub fn with_capacity(capacity: usize) -> Self {
        or_alloc_panic(Self::try_with_capacity(capacity))
    }

    /// Fallible [`with_capacity`](Self::with_capacity).
    ///
    /// # Errors
    /// [`RingError::CapacityOverflow`] if `capacity` exceeds
    /// [`max_size`](Self::max_size); [`RingError::AllocFailed`] if the
    /// global allocator refuses.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, RingError> {
        Self::try_with_capacity_in(capacity, Global)
    }

    /// Creates a full buffer of `n` clones of `value` (capacity `n`).
    pub fn from_elem(n: usize, value: T) -> Self
    where
        T: Clone,
    {
        or_alloc_panic(Self::try_from_elem_in(n, n, value, Global))
    }

    /// Creates a buffer of capacity `capacity` from `iter`, keeping only the
    /// last `capacity` items.
    pub fn from_iter_with_capacity<I>(capacity: usize, iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        or_alloc_panic(Self::try_from_iter_with_capacity_in(capacity, iter, Global))
    }
}

impl<T, A: Allocator> CircularBuffer<T, A> {
    /// Creates an empty zero-capacity buffer using `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self {
            storage: StorageBlock::empty(alloc),
            first: 0,
            len: 0,
        }
    }

    /// Creates an empty buffer of `capacity` slots from `alloc`.
    ///
    /// # Errors
    /// [`RingError::CapacityOverflow`] if `capacity` exceeds the allocator's
    /// `max_size`; [`RingError::AllocFailed`] if the allocator refuses.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, RingError> {
        Ok(Self {
            storage: StorageBlock::try_new(capacity, alloc)?,
            first: 0,
            len: 0,
        })
    }

    /// Creates a buffer of capacity `capacity` holding `n` clones of
    /// `value` (`n <= capacity`).
    ///
    /// # Panics
    /// Panics if `n > capacity`.
    pub fn try_from_elem_in(
        capacity: usize,
        n: usize,
        value: T,
        alloc: A,
    ) -> Result<Self, RingError>
    where
        T: Clone,
    {
        assert!(n <= capacity, "element count {n} exceeds capacity {capacity}");
        let mut buf = Self::try_with_capacity_in(capacity, alloc)?;
        buf.fill_back(n, value);
        Ok(buf)
    }

    /// Creates a buffer of `capacity` slots and pushes every item of `iter`
    /// to the back, so only the last `capacity` items survive.
    pub fn try_from_iter_with_capacity_in<I>(
        capacity: usize,
        iter: I,
        alloc: A,
    ) -> Result<Self, RingError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut buf = Self::try_with_capacity_in(capacity, alloc)?;
        buf.extend(iter);
        Ok(buf)
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true when `len == capacity` (including capacity 0).
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Maximum number of live elements before pushes start overwriting.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Free slots: `capacity - len`.
    #[inline]
    pub fn reserve(&self) -> usize {
        self.capacity() - self.len
    }

    /// Largest capacity the allocator can provide for `T`.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.storage.allocator().max_size::<T>()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.storage.allocator()
    }

    /// Element at logical `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: `index < len`, so the slot is live.
        Some(unsafe { &*self.storage.slot(self.phys(index)) })
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        // SAFETY: `index < len`; `&mut self` guarantees uniqueness.
        Some(unsafe { &mut *self.storage.slot(self.phys(index)) })
    }

    /// Bounds-checked access.
    ///
    /// # Errors
    /// [`RingError::OutOfRange`] when `index >= len`; the buffer is unchanged.
    pub fn at(&self, index: usize) -> Result<&T, RingError> {
        let len = self.len;
        self.get(index)
            .ok_or(RingError::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, RingError> {
        let len = self.len;
        self.get_mut(index)
            .ok_or(RingError::OutOfRange { index, len })
    }

    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        match self.len.checked_sub(1) {
            Some(i) => self.get_mut(i),
            None => None,
        }
    }

    /// Appends `value` at the back.
    ///
    /// When full, the front element is dropped and its slot reused; the
    /// front position then refers to the next-oldest element. With capacity 0
    /// `value` is dropped.
    ///
    /// Invalidation: no existing position changes unless the buffer was
    /// full, in which case every position shifts by one.
    pub fn push_back(&mut self, value: T) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        if self.is_full() {
            let slot = self.first;
            self.first = index::increment(self.first, cap);
            self.len -= 1;
            // SAFETY: the old front slot left the run above but still holds
            // its value.
            unsafe { self.storage.destroy(slot) };
            // SAFETY: `slot` now sits just past the back and is uninitialised.
            unsafe { self.storage.write(slot, value) };
            self.len += 1;
        } else {
            let slot = self.phys(self.len);
            // SAFETY: `len < cap`, so the slot after the back is free.
            unsafe { self.storage.write(slot, value) };
            self.len += 1;
        }
    }

    /// Prepends `value` at the front.
    ///
    /// When full, the back element is dropped and its slot reused.
    ///
    /// Invalidation: every position shifts by one.
    pub fn push_front(&mut self, value: T) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        let slot = index::decrement(self.first, cap);
        if self.is_full() {
            self.len -= 1;
            // SAFETY: in a full ring the slot before the front holds the back,
            // which `len` no longer counts.
            unsafe { self.storage.destroy(slot) };
            // SAFETY: the slot was just vacated.
            unsafe { self.storage.write(slot, value) };
            self.first = slot;
            self.len += 1;
        } else {
            // SAFETY: `len < cap`, so the slot before the front is free.
            unsafe { self.storage.write(slot, value) };
            self.first = slot;
            self.len += 1;
        }
    }

    /// Removes and returns the back element, or `None` when empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let slot = self.phys(self.len);
        // SAFETY: the slot held the back element and is now outside the run.
        Some(unsafe { self.storage.read(slot) })
    }

    /// Removes and returns the front element, or `None` when empty.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = self.first;
        self.first = index::increment(self.first, self.capacity());
        self.len -= 1;
        // SAFETY: the slot held the front element and is now outside the run.
        Some(unsafe { self.storage.read(slot) })
    }

    /// Drops every element. Capacity is unchanged.
    pub fn clear(&mut self) {
        let (head, tail) = self.span_runs(0, self.len);
        self.first = 0;
        self.len = 0;
        // SAFETY: both runs were live and are now outside the bookkeeping.
        unsafe {
            self.storage.destroy_range(head);
            self.storage.destroy_range(tail);
        }
    }

    /// The live elements as two slices: the run from the front towards the
    /// end of storage, then the wrapped remainder (possibly empty).
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (head, tail) = self.span_runs(0, self.len);
        // SAFETY: both runs are live.
        unsafe { (self.storage.slice(head), self.storage.slice(tail)) }
    }

    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        let (head, tail) = self.span_runs(0, self.len);
        // SAFETY: both runs are live and disjoint; `&mut self` is unique.
        unsafe { (self.storage.slice_mut(head), self.storage.slice_mut(tail)) }
    }

    /// True when the live run does not wrap past the end of storage.
    pub fn is_contiguous(&self) -> bool {
        self.as_slices().1.is_empty()
    }

    /// True when logical order equals physical order starting at slot 0,
    /// i.e. [`linearize`](Self::linearize) would not move anything.
    pub fn is_linearized(&self) -> bool {
        self.len == 0 || self.first == 0
    }

    /// Iterates front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        let (head, tail) = self.as_slices();
        Iter::new(head, tail)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let (head, tail) = self.as_mut_slices();
        IterMut::new(head, tail)
    }

    /// Position of the front element (equal to [`end`](Self::end) when empty).
    pub fn begin(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, 0)
    }

    /// Position one past the back element.
    pub fn end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.len)
    }

    /// Position at logical `index`.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn cursor(&self, index: usize) -> Cursor<'_, T, A> {
        assert!(
            index <= self.len,
            "cursor index {index} out of bounds (len {})",
            self.len
        );
        Cursor::new(self, index)
    }

    /// Swaps contents, capacity, and allocator with `other` in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Asserts the bookkeeping invariants. Used by tests and fuzzing.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let cap = self.capacity();
        assert!(self.len <= cap, "len {} exceeds capacity {cap}", self.len);
        if cap == 0 {
            assert_eq!(self.first, 0, "zero-capacity ring with first != 0");
        } else {
            assert!(self.first < cap, "first {} out of bounds", self.first);
        }
        let (head, tail) = self.as_slices();
        assert_eq!(head.len() + tail.len(), self.len);
        assert_eq!(self.is_full(), self.len == cap);
    }

    // --------------------------------------------------------------------
    // Internal helpers shared by the mutation modules.
    // --------------------------------------------------------------------

    #[inline]
    fn phys(&self, logical: usize) -> usize {
        index::physical(self.first, logical, self.capacity())
    }

    /// Physical runs covering `count` elements from logical `start`.
    #[inline]
    fn span_runs(&self, start: usize, count: usize) -> (Range<usize>, Range<usize>) {
        index::runs(self.phys(start), count, self.capacity())
    }

    /// Opens `k` uninitialised slots at logical `[pos, pos + k)` by moving
    /// the shorter of the front segment `[0, pos)` (backwards) or the back
    /// segment `[pos, len)` (forwards). `len` is left unchanged; the caller
    /// fills the gap and then adds `k`.
    ///
    /// # Safety
    /// `pos <= len` and `len + k <= capacity`. No user code may run between
    /// this call and the gap being filled or closed.
    unsafe fn open_gap(&mut self, pos: usize, k: usize) {
        debug_assert!(pos <= self.len);
        debug_assert!(self.len + k <= self.capacity());
        if k == 0 {
            return;
        }
        let cap = self.capacity();
        if pos < self.len - pos {
            let new_first = index::sub(self.first, k, cap);
            for i in 0..pos {
                let from = index::physical(self.first, i, cap);
                let to = index::physical(new_first, i, cap);
                // SAFETY: ascending order reads every source before the
                // destination that overlaps it is written.
                unsafe { self.storage.relocate(from, to) };
            }
            self.first = new_first;
        } else {
            for i in (pos..self.len).rev() {
                let from = self.phys(i);
                let to = self.phys(i + k);
                // SAFETY: descending order, mirror of the branch above.
                unsafe { self.storage.relocate(from, to) };
            }
        }
    }

    /// Closes `k` uninitialised slots at logical `[pos, pos + k)` by moving
    /// the shorter neighbouring segment. Ties move the back segment unless
    /// `prefer_front`. On entry `len` still counts the gap; on return it
    /// does not.
    ///
    /// # Safety
    /// `pos + k <= len` and the gap slots hold no live values.
    unsafe fn close_gap(&mut self, pos: usize, k: usize, prefer_front: bool) {
        debug_assert!(pos + k <= self.len);
        if k == 0 {
            return;
        }
        let cap = self.capacity();
        let front = pos;
        let back = self.len - pos - k;
        let move_front = if prefer_front {
            front <= back
        } else {
            front < back
        };
        if move_front {
            for i in (0..pos).rev() {
                // SAFETY: descending order; destinations are the gap or
                // already-moved slots.
                unsafe { self.storage.relocate(self.phys(i), self.phys(i + k)) };
            }
            self.first = index::add(self.first, k, cap);
        } else {
            for i in pos + k..self.len {
                // SAFETY: ascending order, mirror of the branch above.
                unsafe { self.storage.relocate(self.phys(i), self.phys(i - k)) };
            }
        }
        self.len -= k;
        if self.len == 0 {
            self.first = 0;
        }
    }

    /// Pushes `n` clones of `value` to the back (`n <= reserve`). The last
    /// push moves `value` instead of cloning it.
    ///
    /// If `Clone` panics, the elements pushed so far remain.
    fn fill_back(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        debug_assert!(n <= self.reserve());
        if n == 0 {
            return;
        }
        for _ in 1..n {
            self.push_back(value.clone());
        }
        self.push_back(value);
    }

    /// Front-end mirror of [`fill_back`](Self::fill_back).
    fn fill_front(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        debug_assert!(n <= self.reserve());
        if n == 0 {
            return;
        }
        for _ in 1..n {
            self.push_front(value.clone());
        }
        self.push_front(value);
    }
}

/// Converts a construction error into the std-collection failure modes:
/// `handle_alloc_error` for a refused allocation, a panic for overflow.
pub(crate) fn or_alloc_panic<B>(result: Result<B, RingError>) -> B {
    match result {
        Ok(buf) => buf,
        Err(RingError::AllocFailed { size, align }) => {
            match std::alloc::Layout::from_size_align(size, align) {
                Ok(layout) => std::alloc::handle_alloc_error(layout),
                Err(_) => panic!("allocation of {size} bytes failed"),
            }
        }
        Err(err) => panic!("{err}"),
    }
}

impl<T, A: Allocator> Drop for CircularBuffer<T, A> {
    fn drop(&mut self) {
        self.clear();
        debug_assert!(self.len == 0);
    }
}

impl<T> Default for CircularBuffer<T, Global> {
    /// An empty zero-capacity buffer. `std::mem::take` therefore leaves the
    /// source empty with capacity 0.
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for CircularBuffer<T, A> {
    /// Clones every element into a fresh block of the same capacity.
    ///
    /// If an element's `Clone` panics, the partial copy is dropped and
    /// `self` is untouched.
    fn clone(&self) -> Self {
        let mut out = or_alloc_panic(Self::try_with_capacity_in(
            self.capacity(),
            self.allocator().clone(),
        ));
        for item in self.iter() {
            out.push_back(item.clone());
        }
        out
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for CircularBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: Allocator> Index<usize> for CircularBuffer<T, A> {
    type Output = T;

    /// # Panics
    /// Panics if `index >= len`.
    fn index(&self, index: usize) -> &T {
        let len = self.len;
        match self.get(index) {
            Some(item) => item,
            None => panic!("index {index} out of bounds (len {len})"),
        }
    }
}

impl<T, A: Allocator> IndexMut<usize> for CircularBuffer<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index {index} out of bounds (len {len})"),
        }
    }
}

impl<T, A: Allocator> Extend<T> for CircularBuffer<T, A> {
    /// Pushes every item to the back, overwriting the front once full.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for CircularBuffer<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T> FromIterator<T> for CircularBuffer<T, Global> {
    /// Collects every item; the capacity equals the item count.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        or_alloc_panic(Self::try_from_iter_in(iter, Global))
    }
}

impl<T, const N: usize> From<[T; N]> for CircularBuffer<T, Global> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T, A: Allocator> IntoIterator for CircularBuffer<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a CircularBuffer<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut CircularBuffer<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, U, A: Allocator, B: Allocator> PartialEq<CircularBuffer<U, B>> for CircularBuffer<T, A>
where
    T: PartialEq<U>,
{
    /// Element-wise; capacity does not participate.
    fn eq(&self, other: &CircularBuffer<U, B>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for CircularBuffer<T, A> {}

impl<T, U, A: Allocator> PartialEq<[U]> for CircularBuffer<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, U, A: Allocator, const N: usize> PartialEq<[U; N]> for CircularBuffer<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self == &other[..]
    }
}

impl<T, U, A: Allocator> PartialEq<&[U]> for CircularBuffer<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self == *other
    }
}

impl<T, U, A: Allocator> PartialEq<Vec<U>> for CircularBuffer<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        self == other.as_slice()
    }
}

impl<T: PartialOrd, A: Allocator> PartialOrd for CircularBuffer<T, A> {
    /// Lexicographic, like slices.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, A: Allocator> Ord for CircularBuffer<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, A: Allocator> Hash for CircularBuffer<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for item in self.iter() {
            item.hash(state);
        }
    }
}
