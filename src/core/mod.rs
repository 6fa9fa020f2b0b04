//! Core deterministic primitives.
//!
//! Nothing in this module reads a wall clock or unseeded randomness;
//! a play-through driven by the same inputs and seed is reproducible.

pub mod geometry;
pub mod rng;
pub mod timer;
pub mod hash;

// Re-export core types
pub use geometry::{Point, Rect};
pub use rng::{DeterministicRng, RandomSource};
pub use timer::{Millis, TimerId, TimerQueue};
pub use hash::{StateHash, StateHasher, compute_state_hash};
