//! Front-to-back iterators over a [`CircularBuffer`].
//!
//! Borrowing iterators walk the two physical runs one after the other, so
//! they cost the same as slice iteration.

use std::fmt;
use std::iter::FusedIterator;
use std::slice;

use super::CircularBuffer;
use crate::alloc::Allocator;

/// Shared iterator returned by [`CircularBuffer::iter`].
pub struct Iter<'a, T> {
    head: slice::Iter<'a, T>,
    tail: slice::Iter<'a, T>,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(head: &'a [T], tail: &'a [T]) -> Self {
        Self {
            head: head.iter(),
            tail: tail.iter(),
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            tail: self.tail.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter")
            .field(&self.head.as_slice())
            .field(&self.tail.as_slice())
            .finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        match self.head.next() {
            Some(item) => Some(item),
            None => {
                std::mem::swap(&mut self.head, &mut self.tail);
                self.head.next()
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len();
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        let head_len = self.head.len();
        if n < head_len {
            return self.head.nth(n);
        }
        self.head = std::mem::take(&mut self.tail);
        self.head.nth(n - head_len)
    }

    fn fold<B, F>(self, init: B, mut f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        let acc = self.head.fold(init, &mut f);
        self.tail.fold(acc, &mut f)
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        match self.tail.next_back() {
            Some(item) => Some(item),
            None => self.head.next_back(),
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    #[inline]
    fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator returned by [`CircularBuffer::iter_mut`].
pub struct IterMut<'a, T> {
    head: slice::IterMut<'a, T>,
    tail: slice::IterMut<'a, T>,
}

impl<'a, T> IterMut<'a, T> {
    pub(super) fn new(head: &'a mut [T], tail: &'a mut [T]) -> Self {
        Self {
            head: head.iter_mut(),
            tail: tail.iter_mut(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IterMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IterMut")
            .field(&self.head.as_slice())
            .field(&self.tail.as_slice())
            .finish()
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        match self.head.next() {
            Some(item) => Some(item),
            None => {
                std::mem::swap(&mut self.head, &mut self.tail);
                self.head.next()
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len();
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        let head_len = self.head.len();
        if n < head_len {
            return self.head.nth(n);
        }
        self.head = std::mem::take(&mut self.tail);
        self.head.nth(n - head_len)
    }

    fn fold<B, F>(self, init: B, mut f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        let acc = self.head.fold(init, &mut f);
        self.tail.fold(acc, &mut f)
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        match self.tail.next_back() {
            Some(item) => Some(item),
            None => self.head.next_back(),
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {
    #[inline]
    fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator returned by `CircularBuffer::into_iter`. Unyielded
/// elements are dropped with the iterator.
pub struct IntoIter<T, A: Allocator> {
    buf: CircularBuffer<T, A>,
}

impl<T, A: Allocator> IntoIter<T, A> {
    pub(super) fn new(buf: CircularBuffer<T, A>) -> Self {
        Self { buf }
    }

    /// The elements not yet yielded.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        self.buf.as_slices()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.buf).finish()
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.buf.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.buf.len(), Some(self.buf.len()))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.buf.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}
