//! Positional insertion: single values, `n` copies, and iterator ranges, in
//! both orientations.
//!
//! `insert*` treats the back as the growing end: once full, each accepted
//! element evicts the current front. `rinsert*` mirrors this and evicts the
//! back. Either way the final layout equals a sequence of single inserts
//! that keep the input order.
//!
//! # Panic safety
//! Range inserts fill an uninitialised gap while user code (the iterator or
//! `Clone`) runs. [`GapGuard`] closes whatever part of the gap is still
//! unfilled when that code panics, so the buffer keeps the elements written
//! so far. Elements evicted before the fill started stay dropped.

use std::iter;

use super::CircularBuffer;
use crate::alloc::Allocator;

/// Keeps a partially filled insertion gap consistent.
///
/// The gap spans logical `[pos, pos + gap)` and is excluded from `len`
/// while the guard lives. On drop the guard counts the gap back into `len`
/// and closes the `gap - filled` slots that were never written.
struct GapGuard<'b, T, A: Allocator> {
    buf: &'b mut CircularBuffer<T, A>,
    pos: usize,
    gap: usize,
    filled: usize,
}

impl<T, A: Allocator> GapGuard<'_, T, A> {
    /// Writes `value` into the next unfilled gap slot.
    #[inline]
    fn fill(&mut self, value: T) {
        debug_assert!(self.filled < self.gap);
        let slot = self.buf.phys(self.pos + self.filled);
        // SAFETY: gap slots are uninitialised until written here, once each.
        unsafe { self.buf.storage.write(slot, value) };
        self.filled += 1;
    }
}

impl<T, A: Allocator> Drop for GapGuard<'_, T, A> {
    fn drop(&mut self) {
        self.buf.len += self.gap;
        // SAFETY: exactly the slots past `filled` are still uninitialised.
        unsafe {
            self.buf
                .close_gap(self.pos + self.filled, self.gap - self.filled, false)
        };
    }
}

impl<T, A: Allocator> CircularBuffer<T, A> {
    /// Inserts `value` before logical `pos` and returns its index.
    ///
    /// Not full: the shorter of `[0, pos)` and `[pos, len)` shifts by one.
    /// Full: the front element is evicted to make room, so the returned
    /// index is `pos - 1`. When full and `pos == 0` the value would be the
    /// one evicted, so it is dropped and 0 is returned.
    ///
    /// Invalidation: every position at or after the shifted segment.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn insert(&mut self, pos: usize, value: T) -> usize {
        self.check_insert_pos(pos);
        if self.capacity() == 0 {
            return 0;
        }
        if !self.is_full() {
            self.insert_within_reserve(pos, value);
            return pos;
        }
        if pos == 0 {
            return 0;
        }

        let front = self.first;
        self.first = super::index::increment(self.first, self.capacity());
        self.len -= 1;
        // SAFETY: the old front slot left the run above but still holds its
        // value.
        unsafe { self.storage.destroy(front) };
        self.insert_within_reserve(pos - 1, value);
        pos - 1
    }

    /// Inserts `value` before logical `pos`, evicting the back when full.
    ///
    /// When full and `pos == len` the value would be the one evicted, so it
    /// is dropped and `len` is returned. Otherwise returns the index of the
    /// inserted element.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn rinsert(&mut self, pos: usize, value: T) -> usize {
        self.check_insert_pos(pos);
        if self.capacity() == 0 {
            return 0;
        }
        if !self.is_full() {
            self.insert_within_reserve(pos, value);
            return pos;
        }
        if pos == self.len {
            return self.len;
        }

        self.len -= 1;
        let back = self.phys(self.len);
        // SAFETY: the back slot was live and `len` no longer counts it.
        unsafe { self.storage.destroy(back) };
        self.insert_within_reserve(pos, value);
        pos
    }

    /// Inserts `n` clones of `value` before `pos`, evicting from the front
    /// once full. At most `pos + reserve` copies fit.
    ///
    /// Returns the index one past the last inserted copy.
    pub fn insert_n(&mut self, pos: usize, n: usize, value: &T) -> usize
    where
        T: Clone,
    {
        self.check_insert_pos(pos);
        let accepted = n.min(pos + self.reserve());
        self.insert_iter(pos, iter::repeat_n(value, accepted).cloned())
    }

    /// Inserts `n` clones of `value` before `pos`, evicting from the back
    /// once full. At most `(len - pos) + reserve` copies fit.
    ///
    /// Returns the index one past the last inserted copy.
    pub fn rinsert_n(&mut self, pos: usize, n: usize, value: &T) -> usize
    where
        T: Clone,
    {
        self.check_insert_pos(pos);
        let accepted = n.min(self.len - pos + self.reserve());
        self.rinsert_iter(pos, iter::repeat_n(value, accepted).cloned())
    }

    /// Inserts every item of `items` before `pos`, in order, evicting from
    /// the front once full.
    ///
    /// At most `pos + reserve` items survive; earlier excess items are
    /// dropped, exactly as a loop of single inserts would. Iterators with an
    /// exact `size_hint` are placed with one shift; others fall back to
    /// per-element insertion.
    ///
    /// The exact path sizes its evictions from the hint. An iterator that
    /// yields fewer items than it reported leaves those evictions in place
    /// and the unfilled gap closed; one that yields more is not pulled past
    /// the reported count. The buffer stays consistent either way.
    ///
    /// Returns the index one past the last inserted item.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn insert_iter<I>(&mut self, pos: usize, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        self.check_insert_pos(pos);
        let limit = pos + self.reserve();
        if limit == 0 {
            return pos;
        }
        let mut items = items.into_iter();

        let n = match items.size_hint() {
            (lower, Some(upper)) if lower == upper => lower,
            _ => {
                let mut at = pos;
                for item in items {
                    at = self.insert(at, item) + 1;
                }
                return at;
            }
        };

        let accepted = n.min(limit);
        if n > accepted {
            // The earliest excess items would be evicted by later ones.
            items.nth(n - accepted - 1);
        }
        let evict = accepted.saturating_sub(self.reserve());
        self.erase_begin(evict);
        self.fill_gap(pos - evict, accepted, items)
    }

    /// Inserts every item of `items` before `pos`, in order, evicting from
    /// the back once full.
    ///
    /// At most `(len - pos) + reserve` items are accepted; items past that
    /// point are never pulled from the iterator. A misreported exact
    /// `size_hint` is handled as in [`insert_iter`](Self::insert_iter).
    ///
    /// Returns the index one past the last inserted item.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn rinsert_iter<I>(&mut self, pos: usize, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        self.check_insert_pos(pos);
        let limit = self.len - pos + self.reserve();
        if limit == 0 {
            return pos;
        }
        let items = items.into_iter().take(limit);

        let n = match items.size_hint() {
            (lower, Some(upper)) if lower == upper => lower,
            _ => {
                let mut at = pos;
                for item in items {
                    at = self.rinsert(at, item) + 1;
                }
                return at;
            }
        };

        let evict = n.saturating_sub(self.reserve());
        self.erase_end(evict);
        self.fill_gap(pos, n, items)
    }

    /// Opens a gap of `count` slots at `pos` and fills it from `items`.
    /// Returns the index one past the last filled slot.
    fn fill_gap<I>(&mut self, pos: usize, count: usize, items: I) -> usize
    where
        I: Iterator<Item = T>,
    {
        debug_assert!(count <= self.reserve());
        // SAFETY: `count <= reserve` and the guard below owns the gap until
        // it is filled or closed.
        unsafe { self.open_gap(pos, count) };
        let mut guard = GapGuard {
            buf: self,
            pos,
            gap: count,
            filled: 0,
        };
        for item in items.take(count) {
            guard.fill(item);
        }
        pos + guard.filled
    }

    /// Places `value` at `pos` given at least one free slot.
    fn insert_within_reserve(&mut self, pos: usize, value: T) {
        debug_assert!(self.len < self.capacity());
        // SAFETY: one free slot exists; the gap is filled immediately.
        unsafe {
            self.open_gap(pos, 1);
            self.storage.write(self.phys(pos), value);
        }
        self.len += 1;
    }

    #[inline]
    fn check_insert_pos(&self, pos: usize) {
        assert!(
            pos <= self.len,
            "insertion index {pos} out of bounds (len {})",
            self.len
        );
    }
}
