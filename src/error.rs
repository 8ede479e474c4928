//! Error types for ring buffer operations.
//!
//! Only operations that can fail for reasons outside the caller's control
//! return `RingError`: bounds-checked access, capacity requests the allocator
//! cannot honour, and invalid adaptor configuration. Precondition violations
//! on positional operations (`pos > len`) panic instead, matching the std
//! collections.
//!
//! # Design Notes
//! - The enum is `#[non_exhaustive]`; match with a fallback arm.
//! - Every variant leaves the buffer exactly as it was before the call.

use thiserror::Error;

/// The allocator refused a request.
///
/// Carries no detail; the caller turns it into [`RingError::AllocFailed`]
/// with the layout that was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("memory allocation failed")]
pub struct AllocError;

/// Errors reported by [`CircularBuffer`](crate::CircularBuffer) and
/// [`SpaceOptimized`](crate::SpaceOptimized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RingError {
    /// Bounds-checked access past the last element.
    #[error("index {index} out of range for buffer of length {len}")]
    OutOfRange { index: usize, len: usize },
    /// Requested capacity exceeds what the allocator can address.
    #[error("requested capacity {requested} exceeds maximum {max}")]
    CapacityOverflow { requested: usize, max: usize },
    /// The allocator returned an error for a valid layout.
    #[error("allocation of {size} bytes (align {align}) failed")]
    AllocFailed { size: usize, align: usize },
    /// `min_capacity` was greater than `capacity`.
    #[error("min_capacity {min_capacity} exceeds capacity {capacity}")]
    InvalidCapacityControl { capacity: usize, min_capacity: usize },
}
