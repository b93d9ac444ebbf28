//! Match Controller
//!
//! Owns the fighter registry (through `MatchState`), the held-key state,
//! key bindings and the input recordings. The presentation layer feeds it
//! key names and clock readings and receives events back.

use tracing::info;

use crate::game::config::{ConfigError, MatchConfig};
use crate::game::events::GameEvent;
use crate::game::input::{Action, InputFrame, InputState, KeyBindings, PlayerInputBuffer};
use crate::game::state::{MatchPhase, MatchSnapshot, MatchState, PlayerSlot};
use crate::game::tick::{tick, tick_round_timer, TickResult};

/// Drives one match.
#[derive(Debug)]
pub struct MatchController {
    config: MatchConfig,
    state: MatchState,
    input: InputState,
    bindings: KeyBindings,
    recordings: [PlayerInputBuffer; 2],
}

impl MatchController {
    /// Build a controller with the default key bindings.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        let state = MatchState::new(&config)?;
        Ok(Self {
            config,
            state,
            input: InputState::new(),
            bindings: KeyBindings::default(),
            recordings: PlayerSlot::ALL.map(PlayerInputBuffer::new),
        })
    }

    /// Start the round. A second call is ignored.
    pub fn start(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.state.start(now_ms);
        self.state.take_events()
    }

    /// Handle a key press by raw key name. Unbound keys are ignored, as is
    /// everything once the match is over.
    pub fn key_down(&mut self, key: &str) -> bool {
        match self.bindings.lookup(key) {
            Some((slot, action)) => self.press(slot, action),
            None => false,
        }
    }

    /// Handle a key release by raw key name.
    pub fn key_up(&mut self, key: &str) -> bool {
        match self.bindings.lookup(key) {
            Some((slot, action)) => self.release(slot, action),
            None => false,
        }
    }

    /// Press an action for a player. The attack starts on the next tick.
    pub fn press(&mut self, slot: PlayerSlot, action: Action) -> bool {
        if self.state.is_ended() {
            return false;
        }
        self.input.press(slot, action);
        true
    }

    /// Release an action for a player.
    pub fn release(&mut self, slot: PlayerSlot, action: Action) -> bool {
        if self.state.is_ended() {
            return false;
        }
        self.input.release(slot, action);
        true
    }

    /// Run one frame tick, recording this tick's input first.
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        if self.state.phase == MatchPhase::Playing {
            let next_tick = self.state.tick + 1;
            for recording in &mut self.recordings {
                let frame = InputFrame::capture(self.input.get(recording.slot));
                recording.record(next_tick, frame);
            }
        }
        tick(&mut self.state, &mut self.input, now_ms)
    }

    /// Apply countdown seconds due by `now_ms`.
    pub fn poll_timer(&mut self, now_ms: u64) -> TickResult {
        tick_round_timer(&mut self.state, now_ms)
    }

    /// Restore both fighters and the clock, then resume play from `now_ms`.
    pub fn reset(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.state.reset();
        self.input.clear();
        for recording in &mut self.recordings {
            recording.clear();
        }

        info!(now_ms, "match reset");
        self.state.push_event(GameEvent::match_reset(0, now_ms));
        self.state.start(now_ms);
        self.state.take_events()
    }

    /// Render snapshot.
    pub fn snapshot(&self) -> MatchSnapshot {
        self.state.snapshot()
    }

    /// Current match state.
    #[inline]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Config the match was built from.
    #[inline]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Input recordings since the last start or reset.
    #[inline]
    pub fn recordings(&self) -> &[PlayerInputBuffer; 2] {
        &self.recordings
    }
}
