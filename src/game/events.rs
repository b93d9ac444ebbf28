//! Game Events
//!
//! Everything the presentation layer reacts to (health bars, timer text,
//! the result banner, the impact flash) is emitted as an event instead of
//! being written to a UI directly.

use serde::{Serialize, Deserialize};

use crate::core::vec2::FixedVec2;
use crate::game::fighter::Pose;
use crate::game::state::{EndReason, MatchResult, PlayerSlot};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Round started (or restarted after a reset)
    MatchStarted {
        /// Seconds on the clock
        round_seconds: u32,
    },

    /// A fighter began an attack
    AttackStarted {
        /// Attacking player
        slot: PlayerSlot,
        /// Attack pose chosen
        pose: Pose,
    },

    /// An attack landed
    FighterHit {
        /// Player whose attack landed
        attacker: PlayerSlot,
        /// Player who was hit
        defender: PlayerSlot,
        /// Defender's health after the hit
        health: u32,
        /// Centre of the attack box
        impact: FixedVec2,
    },

    /// A fighter's health reached zero
    FighterKnockedOut {
        /// Knocked out player
        slot: PlayerSlot,
    },

    /// Round timer changed
    TimerChanged {
        /// Seconds left on the clock
        seconds_remaining: u32,
    },

    /// Match ended
    MatchEnded {
        /// Final result
        result: MatchResult,
    },

    /// Match was reset to its initial state
    MatchReset,
}

/// A game event with timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred
    pub tick: u32,

    /// Clock reading when the event occurred (ms)
    pub at_ms: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, at_ms: u64, data: GameEventData) -> Self {
        Self { tick, at_ms, data }
    }

    /// Create match started event.
    pub fn match_started(tick: u32, at_ms: u64, round_seconds: u32) -> Self {
        Self::new(tick, at_ms, GameEventData::MatchStarted { round_seconds })
    }

    /// Create attack started event.
    pub fn attack_started(tick: u32, at_ms: u64, slot: PlayerSlot, pose: Pose) -> Self {
        Self::new(tick, at_ms, GameEventData::AttackStarted { slot, pose })
    }

    /// Create fighter hit event.
    pub fn fighter_hit(
        tick: u32,
        at_ms: u64,
        attacker: PlayerSlot,
        defender: PlayerSlot,
        health: u32,
        impact: FixedVec2,
    ) -> Self {
        Self::new(
            tick,
            at_ms,
            GameEventData::FighterHit {
                attacker,
                defender,
                health,
                impact,
            },
        )
    }

    /// Create knocked out event.
    pub fn knocked_out(tick: u32, at_ms: u64, slot: PlayerSlot) -> Self {
        Self::new(tick, at_ms, GameEventData::FighterKnockedOut { slot })
    }

    /// Create timer changed event.
    pub fn timer_changed(tick: u32, at_ms: u64, seconds_remaining: u32) -> Self {
        Self::new(tick, at_ms, GameEventData::TimerChanged { seconds_remaining })
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, at_ms: u64, result: MatchResult) -> Self {
        Self::new(tick, at_ms, GameEventData::MatchEnded { result })
    }

    /// Create match reset event.
    pub fn match_reset(tick: u32, at_ms: u64) -> Self {
        Self::new(tick, at_ms, GameEventData::MatchReset)
    }

    /// Whether this event ends the match.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::MatchEnded { .. })
    }

    /// Why the match ended, if this is the terminal event.
    pub fn end_reason(&self) -> Option<EndReason> {
        match &self.data {
            GameEventData::MatchEnded { result } => Some(result.reason),
            _ => None,
        }
    }
}

/// Receiver for match events (health bars, timer display, result banner).
pub trait MatchObserver {
    /// Called once per event, in emission order.
    fn on_event(&mut self, event: &GameEvent);
}

/// Feed a batch of events to an observer.
pub fn dispatch<O: MatchObserver + ?Sized>(events: &[GameEvent], observer: &mut O) {
    for event in events {
        observer.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Winner;

    struct Recorder(Vec<u32>);

    impl MatchObserver for Recorder {
        fn on_event(&mut self, event: &GameEvent) {
            self.0.push(event.tick);
        }
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let events = vec![
            GameEvent::timer_changed(1, 1000, 59),
            GameEvent::attack_started(2, 1016, PlayerSlot::Player1, Pose::Attack),
            GameEvent::knocked_out(3, 1032, PlayerSlot::Player2),
        ];
        let mut recorder = Recorder(Vec::new());
        dispatch(&events, &mut recorder);
        assert_eq!(recorder.0, vec![1, 2, 3]);
    }

    #[test]
    fn test_terminal_event() {
        let result = MatchResult {
            winner: Winner::Player2,
            reason: EndReason::TimeUp,
            player1_health: 40,
            player2_health: 60,
        };
        let ended = GameEvent::match_ended(10, 60_000, result);
        assert!(ended.is_terminal());
        assert_eq!(ended.end_reason(), Some(EndReason::TimeUp));
        assert!(!GameEvent::match_reset(0, 0).is_terminal());
    }
}
