//! Core deterministic primitives.
//!
//! Fixed-point scalars and vectors for the simulation, plus state hashing
//! for replay verification.

pub mod fixed;
pub mod vec2;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use hash::{compute_state_hash, StateHash};
