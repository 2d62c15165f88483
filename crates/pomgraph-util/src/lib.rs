//! Shared utilities for pomgraph.
//!
//! This crate provides the cross-cutting error type used by every other
//! pomgraph crate and the stderr status lines used by the operations.

pub mod errors;
pub mod progress;
