//! Wraparound index arithmetic shared by the buffer, its cursor, and its
//! iterators.
//!
//! Purpose: map between logical positions (`0..len`, iteration order) and
//! physical slots (`0..capacity`) of a ring whose front lives at `first`.
//!
//! Invariants:
//! - Inputs are physical indices `< cap` (or `0` when `cap == 0`).
//! - Outputs stay in `[0, cap)`; every function returns `0` for `cap == 0`.
//!
//! Design notes:
//! - `add`/`sub` take distances `<= cap` and never overflow: they compare
//!   against the distance to the boundary instead of computing `p + n`.
//! - Signed movement happens on logical indices (see the cursor), which are
//!   bounded by `len`, so no signed physical arithmetic is needed here.

use std::ops::Range;

/// Returns `(p + n) mod cap` for `n <= cap` without overflow.
#[inline]
pub(crate) fn add(p: usize, n: usize, cap: usize) -> usize {
    debug_assert!(n <= cap, "add distance {n} exceeds capacity {cap}");
    debug_assert!(p < cap || cap == 0);
    if n >= cap - p {
        n - (cap - p)
    } else {
        p + n
    }
}

/// Returns `(p - n) mod cap` for `n <= cap` without underflow.
#[inline]
pub(crate) fn sub(p: usize, n: usize, cap: usize) -> usize {
    debug_assert!(n <= cap, "sub distance {n} exceeds capacity {cap}");
    debug_assert!(p < cap || cap == 0);
    if n > p {
        p + (cap - n)
    } else {
        p - n
    }
}

/// Next physical slot, wrapping at `cap`.
#[inline]
pub(crate) fn increment(p: usize, cap: usize) -> usize {
    if cap == 0 {
        return 0;
    }
    add(p, 1, cap)
}

/// Previous physical slot, wrapping at `0`.
#[inline]
pub(crate) fn decrement(p: usize, cap: usize) -> usize {
    if cap == 0 {
        return 0;
    }
    sub(p, 1, cap)
}

/// Physical slot of logical position `logical` for a ring starting at
/// `first`. `logical` may equal `cap` (the slot one past a full ring).
#[inline]
pub(crate) fn physical(first: usize, logical: usize, cap: usize) -> usize {
    if cap == 0 {
        return 0;
    }
    add(first, logical, cap)
}

/// Splits the live run `[first, first + len)` into its two physical ranges:
/// the run from `first` towards the end of storage, and the wrapped part
/// starting at slot 0 (possibly empty).
#[inline]
pub(crate) fn runs(first: usize, len: usize, cap: usize) -> (Range<usize>, Range<usize>) {
    debug_assert!(len <= cap);
    let head = len.min(cap - first);
    (first..first + head, 0..len - head)
}


// Run with: cargo kani --harness verify_add_sub_roundtrip
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// `add` and `sub` stay in `[0, cap)` and undo each other.
    #[kani::proof]
    fn verify_add_sub_roundtrip() {
        let cap: usize = kani::any();
        let p: usize = kani::any();
        let n: usize = kani::any();
        kani::assume(cap > 0);
        kani::assume(p < cap && n <= cap);

        let up = add(p, n, cap);
        kani::assert(up < cap, "add escaped the ring");
        kani::assert(sub(up, n, cap) == p, "sub does not invert add");
    }

    /// `physical` agrees with a wide modulo for every in-range position.
    #[kani::proof]
    fn verify_physical_matches_modulo() {
        let cap: usize = kani::any();
        let first: usize = kani::any();
        let l: usize = kani::any();
        kani::assume(cap > 0 && cap <= 64);
        kani::assume(first < cap && l <= cap);

        let wide = ((first as u128 + l as u128) % cap as u128) as usize;
        kani::assert(physical(first, l, cap) == wide, "physical disagrees with modulo");
    }
}
