//! # Fight Night
//!
//! Deterministic two-player fighting game match simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FIGHT NIGHT                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Match logic (deterministic)               │
//! │  ├── config.rs   - Arena, timing and fighter config          │
//! │  ├── fighter.rs  - Physics and pose state machine            │
//! │  ├── input.rs    - Held keys, bindings, recordings           │
//! │  ├── state.rs    - Match state, round timer, snapshots       │
//! │  ├── tick.rs     - Authoritative frame tick, replay          │
//! │  ├── collision.rs- Damage and push boxes                     │
//! │  ├── events.rs   - Events for the presentation layer         │
//! │  └── controller.rs - Keys in, events out                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules never read a clock or a random source:
//! - Positions and velocities are Q16.16 fixed-point
//! - Every timed window is an absolute deadline against the caller's clock
//! - Attack presses take effect on the next tick, so recordings replay exactly
//!
//! Given identical clock readings and inputs, two runs produce identical
//! state hashes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use game::config::MatchConfig;
pub use game::controller::MatchController;
pub use game::input::{InputFrame, InputDelta, PlayerInputBuffer};
pub use game::state::{MatchState, PlayerSlot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal frame rate (Hz) at the default 16 ms frame interval
pub const TICK_RATE: u32 = 60;
