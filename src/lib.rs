//! Bounded ring buffer with random-access positions, overwrite-on-full
//! semantics, and positional insert/erase.
//!
//! ## Scope
//! [`CircularBuffer`] stores up to `capacity` elements in one fixed block.
//! Pushing onto a full buffer silently drops the element at the opposite end,
//! which makes it a natural fit for "keep the last N" histories, sliding
//! windows, and bounded producer/consumer queues.
//!
//! ## Key invariants
//! - `len <= capacity`; operations never allocate unless they change
//!   capacity (`set_capacity`, `resize` past capacity, `assign*`).
//! - Logical order (front to back) is independent of where the live run sits
//!   in storage. Positions, comparisons, and iteration use logical order.
//! - Every element is dropped exactly once: on eviction, on erase, or when
//!   the buffer itself is dropped. This holds when user code (`Clone`,
//!   iterators, `Drop`) panics mid-operation.
//!
//! ## Notable entry points
//! - [`CircularBuffer`]: the fixed-capacity ring and its operations.
//! - [`Cursor`]: a borrowed random-access position.
//! - [`SpaceOptimized`] / [`CapacityControl`]: a ring that allocates only
//!   what its contents need, within fixed bounds.
//! - [`Allocator`]: the storage capability; [`Global`] is the default.
//!
//! ## Logging
//! Reallocations are reported through the `log` facade at `trace` level and
//! adaptor growth/shrink decisions at `debug` level. The crate never installs
//! a logger.

pub mod alloc;
pub mod error;
pub mod ring;
pub mod space_optimized;

pub use alloc::{Allocator, Global};
pub use error::{AllocError, RingError};
pub use ring::{CircularBuffer, Cursor, IntoIter, Iter, IterMut};
pub use space_optimized::{CapacityControl, SpaceOptimized};
