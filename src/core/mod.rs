//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing. Everything above this layer draws
//! its randomness from here, which is what makes a match replayable.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
