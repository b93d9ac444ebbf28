//! Game Logic Module
//!
//! All match simulation code. Deterministic given the same clock readings
//! and inputs.
//!
//! ## Module Structure
//!
//! - `config`: Match, arena, timing and fighter configuration
//! - `fighter`: Fighter physics, pose state machine, attack box
//! - `input`: Held keys, key bindings, input recording
//! - `state`: Match state, round timer, snapshots
//! - `tick`: Authoritative frame tick and replay
//! - `collision`: Damage and push box tests
//! - `events`: Game events for the presentation layer
//! - `controller`: Match controller (keys in, events out)

pub mod config;
pub mod fighter;
pub mod input;
pub mod state;
pub mod tick;
pub mod collision;
pub mod events;
pub mod controller;

// Re-export key types
pub use config::{ConfigError, FighterConfig, MatchConfig};
pub use controller::MatchController;
pub use events::{GameEvent, GameEventData, MatchObserver};
pub use fighter::{Fighter, FighterError, Pose};
pub use input::{Action, InputFrame, KeyBindings, PlayerInputBuffer};
pub use state::{EndReason, MatchPhase, MatchResult, MatchSnapshot, MatchState, PlayerSlot, Winner};
pub use tick::{replay_match, TickResult};
