//! Property-based tests for the ring buffer and its adaptor.
//!
//! Run with: `cargo test --test property`

mod ring_model;
mod space_optimized;
