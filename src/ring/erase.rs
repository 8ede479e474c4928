//! Removal by position and by range, plus the O(1) end trims.
//!
//! Range removal drops the elements first and then closes the hole by
//! moving the shorter neighbouring segment. `erase*` breaks ties by moving
//! the back segment and `rerase*` by moving the front one, so a caller can
//! pick which side's positions stay put.

use std::ops::{Bound, RangeBounds};

use super::CircularBuffer;
use crate::alloc::Allocator;

/// Closes an erased hole even if an element destructor panics.
struct HoleGuard<'b, T, A: Allocator> {
    buf: &'b mut CircularBuffer<T, A>,
    pos: usize,
    count: usize,
    prefer_front: bool,
}

impl<T, A: Allocator> Drop for HoleGuard<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: every slot in the hole has been dropped (or leaked by a
        // panicking destructor) and is treated as uninitialised.
        unsafe { self.buf.close_gap(self.pos, self.count, self.prefer_front) };
    }
}

impl<T, A: Allocator> CircularBuffer<T, A> {
    /// Drops the element at `pos` and returns the index now holding its
    /// successor (`pos` itself).
    ///
    /// # Panics
    /// Panics if `pos >= len`.
    pub fn erase(&mut self, pos: usize) -> usize {
        self.check_erase_pos(pos);
        self.remove_span(pos, 1, false)
    }

    /// Drops the elements in `range` and returns `range.start`.
    ///
    /// Invalidation: positions in the moved segment; when the front moves,
    /// positions before `range.start` shift as well.
    ///
    /// # Panics
    /// Panics if the range is decreasing or ends past `len`.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let (start, end) = self.resolve_range(range);
        self.remove_span(start, end - start, false)
    }

    /// Like [`erase`](Self::erase) but prefers moving the front segment.
    /// Returns the index of the element just before the removed one, or 0.
    pub fn rerase(&mut self, pos: usize) -> usize {
        self.check_erase_pos(pos);
        self.remove_span(pos, 1, true).saturating_sub(1)
    }

    /// Like [`erase_range`](Self::erase_range) but prefers moving the front
    /// segment. Returns the index of the element just before the removed
    /// range, or 0.
    pub fn rerase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let (start, end) = self.resolve_range(range);
        self.remove_span(start, end - start, true).saturating_sub(1)
    }

    /// Moves the element at `pos` out, closing the gap.
    pub fn remove(&mut self, pos: usize) -> Option<T> {
        if pos >= self.len {
            return None;
        }
        let slot = self.phys(pos);
        // SAFETY: `pos < len`; the vacated slot is closed immediately.
        unsafe {
            let value = self.storage.read(slot);
            self.close_gap(pos, 1, false);
            Some(value)
        }
    }

    /// Drops the first `n` elements without moving the survivors.
    ///
    /// # Panics
    /// Panics if `n > len`.
    pub fn erase_begin(&mut self, n: usize) {
        assert!(n <= self.len, "erase_begin({n}) exceeds len {}", self.len);
        if n == 0 {
            return;
        }
        let (head, tail) = self.span_runs(0, n);
        self.first = self.phys(n);
        self.len -= n;
        if self.len == 0 {
            self.first = 0;
        }
        // SAFETY: the runs were live and bookkeeping no longer covers them.
        unsafe {
            self.storage.destroy_range(head);
            self.storage.destroy_range(tail);
        }
    }

    /// Drops the last `n` elements without moving the survivors.
    ///
    /// # Panics
    /// Panics if `n > len`.
    pub fn erase_end(&mut self, n: usize) {
        assert!(n <= self.len, "erase_end({n}) exceeds len {}", self.len);
        if n == 0 {
            return;
        }
        let (head, tail) = self.span_runs(self.len - n, n);
        self.len -= n;
        if self.len == 0 {
            self.first = 0;
        }
        // SAFETY: as in `erase_begin`.
        unsafe {
            self.storage.destroy_range(head);
            self.storage.destroy_range(tail);
        }
    }

    /// Keeps the first `len` elements, dropping the rest.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.erase_end(self.len - len);
        }
    }

    /// Drops `count` elements at `pos` and closes the hole. Returns `pos`.
    fn remove_span(&mut self, pos: usize, count: usize, prefer_front: bool) -> usize {
        if count == 0 {
            return pos;
        }
        let (head, tail) = self.span_runs(pos, count);
        let guard = HoleGuard {
            buf: self,
            pos,
            count,
            prefer_front,
        };
        // SAFETY: the runs are live; the guard closes the hole afterwards.
        unsafe {
            guard.buf.storage.destroy_range(head);
            guard.buf.storage.destroy_range(tail);
        }
        drop(guard);
        pos
    }

    fn resolve_range<R: RangeBounds<usize>>(&self, range: R) -> (usize, usize) {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s
                .checked_add(1)
                .unwrap_or_else(|| panic!("range start overflows usize")),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e
                .checked_add(1)
                .unwrap_or_else(|| panic!("range end overflows usize")),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        assert!(start <= end, "range start {start} > end {end}");
        assert!(end <= self.len, "range end {end} out of bounds (len {})", self.len);
        (start, end)
    }

    #[inline]
    fn check_erase_pos(&self, pos: usize) {
        assert!(
            pos < self.len,
            "erase index {pos} out of bounds (len {})",
            self.len
        );
    }
}
