//! Input Capture
//!
//! Pressed-key state per player, the keyboard binding table, and per-tick
//! input frames for recording and replay.
//!
//! Attack presses are queued and consumed by the next tick, so a live match
//! and a replay of its recording start every attack on the same tick.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, RUN_SPEED};
use crate::game::state::PlayerSlot;

// =============================================================================
// ACTIONS
// =============================================================================

/// Player intent behind a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move left while held
    Left,
    /// Move right while held
    Right,
    /// Jump while held and grounded
    Jump,
    /// Start an attack on press
    Attack,
}

/// Horizontal direction key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward x = 0
    Left,
    /// Toward the arena's right edge
    Right,
}

// =============================================================================
// PRESSED-KEY STATE
// =============================================================================

/// Keys currently held by one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    /// Left key held
    pub left: bool,
    /// Right key held
    pub right: bool,
    /// Jump key held
    pub jump: bool,
    /// Most recently pressed direction key
    pub last_direction: Option<Direction>,
    /// Attack pressed since the last tick
    pub attack_queued: bool,
}

impl PlayerInput {
    /// Record a key press.
    pub fn press(&mut self, action: Action) {
        match action {
            Action::Left => {
                self.left = true;
                self.last_direction = Some(Direction::Left);
            }
            Action::Right => {
                self.right = true;
                self.last_direction = Some(Direction::Right);
            }
            Action::Jump => self.jump = true,
            Action::Attack => self.attack_queued = true,
        }
    }

    /// Record a key release. Releasing attack does nothing.
    pub fn release(&mut self, action: Action) {
        match action {
            Action::Left => self.left = false,
            Action::Right => self.right = false,
            Action::Jump => self.jump = false,
            Action::Attack => {}
        }
    }

    /// Horizontal velocity: only the last-pressed direction counts, and only
    /// while it is still held.
    pub fn horizontal_velocity(&self) -> Fixed {
        match self.last_direction {
            Some(Direction::Left) if self.left => -RUN_SPEED,
            Some(Direction::Right) if self.right => RUN_SPEED,
            _ => 0,
        }
    }

    /// Consume a queued attack press.
    pub fn take_attack(&mut self) -> bool {
        std::mem::take(&mut self.attack_queued)
    }
}

/// Held keys for both players.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    players: [PlayerInput; 2],
}

impl InputState {
    /// Nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// One player's keys.
    #[inline]
    pub fn get(&self, slot: PlayerSlot) -> &PlayerInput {
        &self.players[slot.index()]
    }

    /// One player's keys, mutably.
    #[inline]
    pub fn get_mut(&mut self, slot: PlayerSlot) -> &mut PlayerInput {
        &mut self.players[slot.index()]
    }

    /// Record a key press.
    pub fn press(&mut self, slot: PlayerSlot, action: Action) {
        self.get_mut(slot).press(action);
    }

    /// Record a key release.
    pub fn release(&mut self, slot: PlayerSlot, action: Action) {
        self.get_mut(slot).release(action);
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.players = Default::default();
    }

    /// Overwrite one player's keys from a recorded frame.
    pub fn load_frame(&mut self, slot: PlayerSlot, frame: InputFrame) {
        *self.get_mut(slot) = frame.to_player_input();
    }
}

// =============================================================================
// KEY BINDINGS
// =============================================================================

/// Raw key name to (player, action) table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    bindings: BTreeMap<String, (PlayerSlot, Action)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let table = [
            ("a", PlayerSlot::Player1, Action::Left),
            ("d", PlayerSlot::Player1, Action::Right),
            ("w", PlayerSlot::Player1, Action::Jump),
            (" ", PlayerSlot::Player1, Action::Attack),
            ("ArrowLeft", PlayerSlot::Player2, Action::Left),
            ("ArrowRight", PlayerSlot::Player2, Action::Right),
            ("ArrowUp", PlayerSlot::Player2, Action::Jump),
            ("ArrowDown", PlayerSlot::Player2, Action::Attack),
        ];
        Self {
            bindings: table
                .into_iter()
                .map(|(key, slot, action)| (key.to_string(), (slot, action)))
                .collect(),
        }
    }
}

impl KeyBindings {
    /// Resolve a key name.
    pub fn lookup(&self, key: &str) -> Option<(PlayerSlot, Action)> {
        self.bindings.get(key).copied()
    }
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// One player's input for one tick, packed into bit flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed flags:
    /// - Bit 0: left held
    /// - Bit 1: right held
    /// - Bit 2: jump held
    /// - Bit 3: attack pressed this tick
    /// - Bit 4: last direction was left
    /// - Bit 5: last direction was right
    pub flags: u8,
}

impl InputFrame {
    /// Left flag bit
    pub const FLAG_LEFT: u8 = 0x01;
    /// Right flag bit
    pub const FLAG_RIGHT: u8 = 0x02;
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x04;
    /// Attack flag bit
    pub const FLAG_ATTACK: u8 = 0x08;
    /// Last-direction-left bit
    pub const FLAG_LAST_LEFT: u8 = 0x10;
    /// Last-direction-right bit
    pub const FLAG_LAST_RIGHT: u8 = 0x20;

    /// Empty frame (nothing held).
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Capture a player's keys.
    pub fn capture(input: &PlayerInput) -> Self {
        let mut flags = 0;
        if input.left {
            flags |= Self::FLAG_LEFT;
        }
        if input.right {
            flags |= Self::FLAG_RIGHT;
        }
        if input.jump {
            flags |= Self::FLAG_JUMP;
        }
        if input.attack_queued {
            flags |= Self::FLAG_ATTACK;
        }
        match input.last_direction {
            Some(Direction::Left) => flags |= Self::FLAG_LAST_LEFT,
            Some(Direction::Right) => flags |= Self::FLAG_LAST_RIGHT,
            None => {}
        }
        Self { flags }
    }

    /// Expand back to held-key state.
    pub fn to_player_input(self) -> PlayerInput {
        let last_direction = if self.flags & Self::FLAG_LAST_LEFT != 0 {
            Some(Direction::Left)
        } else if self.flags & Self::FLAG_LAST_RIGHT != 0 {
            Some(Direction::Right)
        } else {
            None
        };
        PlayerInput {
            left: self.flags & Self::FLAG_LEFT != 0,
            right: self.flags & Self::FLAG_RIGHT != 0,
            jump: self.flags & Self::FLAG_JUMP != 0,
            last_direction,
            attack_queued: self.flags & Self::FLAG_ATTACK != 0,
        }
    }

    /// Check if this is an idle frame.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags & !(Self::FLAG_LAST_LEFT | Self::FLAG_LAST_RIGHT) == 0
    }
}

// =============================================================================
// INPUT BUFFER
// =============================================================================

/// Input change at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

/// Delta-compressed input recording for one player in one match.
///
/// Only ticks where the frame CHANGED are stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInputBuffer {
    /// Player this recording belongs to
    pub slot: PlayerSlot,
    /// Last recorded tick
    pub end_tick: u32,
    deltas: Vec<InputDelta>,
    #[serde(skip)]
    last_frame: InputFrame,
}

impl PlayerInputBuffer {
    /// Create an empty buffer.
    pub fn new(slot: PlayerSlot) -> Self {
        Self {
            slot,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick. Only stored if it changed.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;
        if frame != self.last_frame {
            self.deltas.push(InputDelta { tick, frame });
            self.last_frame = frame;
        }
    }

    /// Input in effect at a tick.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// All stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Drop everything recorded.
    pub fn clear(&mut self) {
        self.deltas.clear();
        self.end_tick = 0;
        self.last_frame = InputFrame::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_pressed_direction_wins() {
        let mut input = PlayerInput::default();
        input.press(Action::Left);
        assert_eq!(input.horizontal_velocity(), -RUN_SPEED);

        input.press(Action::Right);
        assert_eq!(input.horizontal_velocity(), RUN_SPEED);

        // Right released while left still held: last key was right, so stop
        input.release(Action::Right);
        assert_eq!(input.horizontal_velocity(), 0);

        input.press(Action::Left);
        assert_eq!(input.horizontal_velocity(), -RUN_SPEED);
    }

    #[test]
    fn test_attack_is_queued_once() {
        let mut state = InputState::new();
        state.press(PlayerSlot::Player2, Action::Attack);
        assert!(state.get_mut(PlayerSlot::Player2).take_attack());
        assert!(!state.get_mut(PlayerSlot::Player2).take_attack());
        assert!(!state.get(PlayerSlot::Player1).attack_queued);
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.lookup("a"), Some((PlayerSlot::Player1, Action::Left)));
        assert_eq!(bindings.lookup(" "), Some((PlayerSlot::Player1, Action::Attack)));
        assert_eq!(bindings.lookup("ArrowDown"), Some((PlayerSlot::Player2, Action::Attack)));
        assert_eq!(bindings.lookup("q"), None);
    }

    #[test]
    fn test_frame_capture_roundtrip() {
        let mut input = PlayerInput::default();
        input.press(Action::Right);
        input.press(Action::Left);
        input.press(Action::Jump);
        input.press(Action::Attack);

        let frame = InputFrame::capture(&input);
        assert_eq!(frame.to_player_input(), input);
        assert!(!frame.is_idle());

        input.release(Action::Left);
        input.release(Action::Right);
        input.release(Action::Jump);
        input.take_attack();
        assert!(InputFrame::capture(&input).is_idle());
    }

    #[test]
    fn test_input_buffer_delta_compression() {
        let mut buffer = PlayerInputBuffer::new(PlayerSlot::Player1);
        let held = InputFrame { flags: InputFrame::FLAG_LEFT | InputFrame::FLAG_LAST_LEFT };

        buffer.record(0, InputFrame::new());
        buffer.record(1, held);
        buffer.record(2, held);
        buffer.record(3, held);
        assert_eq!(buffer.deltas().len(), 1);

        buffer.record(4, InputFrame::new());
        assert_eq!(buffer.deltas().len(), 2);
        assert_eq!(buffer.end_tick, 4);
    }

    #[test]
    fn test_input_buffer_get_at() {
        let mut buffer = PlayerInputBuffer::new(PlayerSlot::Player2);
        let jump = InputFrame { flags: InputFrame::FLAG_JUMP };
        let attack = InputFrame { flags: InputFrame::FLAG_ATTACK };

        buffer.record(10, jump);
        buffer.record(20, attack);

        assert!(buffer.get_input_at(5).is_idle());
        assert_eq!(buffer.get_input_at(10), jump);
        assert_eq!(buffer.get_input_at(15), jump);
        assert_eq!(buffer.get_input_at(25), attack);

        buffer.clear();
        assert!(buffer.deltas().is_empty());
        assert!(buffer.get_input_at(25).is_idle());
    }
}
