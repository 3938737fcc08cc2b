//! redline-core — synchronous engine for suggestion-anchored prose review.
//!
//! Everything in this crate is pure computation: diffing two document
//! versions, translating the diff into per-suggestion offset deltas,
//! caching delta computations, and the active-suggestion navigation state
//! machine. No I/O, no async — the `redline` crate owns orchestration,
//! remote calls, and timing.

pub mod active;
pub mod cache;
pub mod delta;
pub mod diff;
pub mod text;
pub mod types;
