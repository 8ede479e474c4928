//! Random-access position into a [`CircularBuffer`].
//!
//! A cursor is a shared borrow of the buffer plus a logical index in
//! `[0, len]`, where `len` is the end position. Ordering, distance and
//! arithmetic all work on the logical index, so two cursors compare
//! correctly even when the live run wraps past the end of storage and the
//! later element sits at a lower physical slot.
//!
//! Because the cursor borrows the buffer, no mutation can happen while it
//! is alive. Mutating operations take plain indices; convert with
//! [`Cursor::index`] before mutating and [`CircularBuffer::cursor`] after.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr;

use super::CircularBuffer;
use crate::alloc::{Allocator, Global};

pub struct Cursor<'a, T, A: Allocator = Global> {
    buf: &'a CircularBuffer<T, A>,
    index: usize,
}

impl<'a, T, A: Allocator> Cursor<'a, T, A> {
    #[inline]
    pub(super) fn new(buf: &'a CircularBuffer<T, A>, index: usize) -> Self {
        debug_assert!(index <= buf.len());
        Self { buf, index }
    }

    /// Logical index of this position (`len` at the end).
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn buffer(&self) -> &'a CircularBuffer<T, A> {
        self.buf
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.index == self.buf.len()
    }

    /// Element under the cursor; `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        self.buf.get(self.index)
    }

    /// Physical storage slot of the element under the cursor; `None` at the
    /// end.
    #[inline]
    pub fn physical(&self) -> Option<usize> {
        if self.is_end() {
            None
        } else {
            Some(self.buf.phys(self.index))
        }
    }

    /// Advances one position. Returns false (and stays put) at the end.
    pub fn move_next(&mut self) -> bool {
        if self.is_end() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Steps back one position. Returns false (and stays put) at the front.
    pub fn move_prev(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Cursor `delta` positions away, or `None` outside `[0, len]`.
    pub fn checked_offset(self, delta: isize) -> Option<Self> {
        let index = self.index.checked_add_signed(delta)?;
        (index <= self.buf.len()).then_some(Self { index, ..self })
    }

    /// Cursor `delta` positions away.
    ///
    /// # Panics
    /// Panics if the result leaves `[0, len]`.
    pub fn offset(self, delta: isize) -> Self {
        match self.checked_offset(delta) {
            Some(cursor) => cursor,
            None => panic!(
                "cursor offset {delta} from {} leaves [0, {}]",
                self.index,
                self.buf.len()
            ),
        }
    }

    /// Signed number of steps from `self` to `other`.
    #[inline]
    pub fn distance(&self, other: &Self) -> isize {
        self.debug_check_same_buffer(other);
        other.index.wrapping_sub(self.index) as isize
    }

    #[inline]
    fn debug_check_same_buffer(&self, other: &Self) {
        debug_assert!(
            ptr::eq(self.buf, other.buf),
            "comparing cursors of different buffers"
        );
    }
}

impl<T, A: Allocator> Clone for Cursor<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: Allocator> Copy for Cursor<'_, T, A> {}

impl<T, A: Allocator> fmt::Debug for Cursor<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("len", &self.buf.len())
            .finish()
    }
}

impl<T, A: Allocator> PartialEq for Cursor<'_, T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.debug_check_same_buffer(other);
        self.index == other.index
    }
}

impl<T, A: Allocator> Eq for Cursor<'_, T, A> {}

impl<T, A: Allocator> PartialOrd for Cursor<'_, T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, A: Allocator> Ord for Cursor<'_, T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.debug_check_same_buffer(other);
        self.index.cmp(&other.index)
    }
}

impl<T, A: Allocator> Add<isize> for Cursor<'_, T, A> {
    type Output = Self;

    fn add(self, delta: isize) -> Self {
        self.offset(delta)
    }
}

impl<T, A: Allocator> Sub<isize> for Cursor<'_, T, A> {
    type Output = Self;

    fn sub(self, delta: isize) -> Self {
        match delta.checked_neg() {
            Some(neg) => self.offset(neg),
            None => panic!("cursor offset overflow"),
        }
    }
}

impl<T, A: Allocator> Add<usize> for Cursor<'_, T, A> {
    type Output = Self;

    fn add(self, n: usize) -> Self {
        let index = self.index.checked_add(n).filter(|&i| i <= self.buf.len());
        match index {
            Some(index) => Self { index, ..self },
            None => panic!("cursor advanced past the end"),
        }
    }
}

impl<T, A: Allocator> Sub<usize> for Cursor<'_, T, A> {
    type Output = Self;

    fn sub(self, n: usize) -> Self {
        match self.index.checked_sub(n) {
            Some(index) => Self { index, ..self },
            None => panic!("cursor moved before the front"),
        }
    }
}

impl<T, A: Allocator> AddAssign<isize> for Cursor<'_, T, A> {
    fn add_assign(&mut self, delta: isize) {
        *self = *self + delta;
    }
}

impl<T, A: Allocator> SubAssign<isize> for Cursor<'_, T, A> {
    fn sub_assign(&mut self, delta: isize) {
        *self = *self - delta;
    }
}

impl<T, A: Allocator> Sub for Cursor<'_, T, A> {
    type Output = isize;

    /// Signed logical distance `self - other`.
    fn sub(self, other: Self) -> isize {
        other.distance(&self)
    }
}
