//! Integration tests for the ring buffer public API.
//!
//! Run with: `cargo test --test integration`

mod scenarios;
