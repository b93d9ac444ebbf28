//! Game State Definitions
//!
//! Match state: the fighter registry, round timer, phase, result and the
//! cosmetic impact marker.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::fixed::{Fixed, to_float};
use crate::core::vec2::FixedVec2;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::config::{ArenaBounds, ConfigError, MatchConfig, TimingConfig};
use crate::game::events::GameEvent;
use crate::game::fighter::{Fighter, Pose};

// =============================================================================
// PLAYER SLOT
// =============================================================================

/// Which of the two players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerSlot {
    /// Left-side player (keyboard a/d/w/space)
    Player1 = 0,
    /// Right-side player (arrow keys)
    Player2 = 1,
}

impl PlayerSlot {
    /// Both slots, player 1 first.
    pub const ALL: [PlayerSlot; 2] = [PlayerSlot::Player1, PlayerSlot::Player2];

    /// Registry index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The other player.
    #[inline]
    pub const fn opponent(self) -> PlayerSlot {
        match self {
            PlayerSlot::Player1 => PlayerSlot::Player2,
            PlayerSlot::Player2 => PlayerSlot::Player1,
        }
    }
}

// =============================================================================
// MATCH PHASE / RESULT
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum MatchPhase {
    /// Built but not started
    #[default]
    Waiting,
    /// Round running
    Playing,
    /// Result decided; physics keeps running, input is frozen
    Ended,
}

/// Match winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Player 1 has more health left
    Player1,
    /// Player 2 has more health left
    Player2,
    /// Equal health
    Draw,
}

impl Winner {
    /// Higher remaining health wins; equal health is a draw.
    pub fn by_health(player1_health: u32, player2_health: u32) -> Self {
        match player1_health.cmp(&player2_health) {
            std::cmp::Ordering::Greater => Winner::Player1,
            std::cmp::Ordering::Less => Winner::Player2,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    /// Winning slot, if not a draw.
    pub fn slot(self) -> Option<PlayerSlot> {
        match self {
            Winner::Player1 => Some(PlayerSlot::Player1),
            Winner::Player2 => Some(PlayerSlot::Player2),
            Winner::Draw => None,
        }
    }
}

/// How the match was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// A fighter's health reached zero
    KnockOut,
    /// Round timer reached zero
    TimeUp,
}

/// Terminal match result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Who won
    pub winner: Winner,
    /// Why the match ended
    pub reason: EndReason,
    /// Player 1 health at the end
    pub player1_health: u32,
    /// Player 2 health at the end
    pub player2_health: u32,
}

// =============================================================================
// ROUND TIMER
// =============================================================================

/// One-second countdown, driven by deadlines.
///
/// `next_tick_at == None` means the countdown is cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    /// Seconds left on the clock
    pub seconds_remaining: u32,
    /// Next decrement deadline (ms)
    pub next_tick_at: Option<u64>,
    round_seconds: u32,
}

impl RoundTimer {
    /// Interval between decrements.
    pub const INTERVAL_MS: u64 = 1000;

    /// Full clock, not running.
    pub fn new(round_seconds: u32) -> Self {
        Self {
            seconds_remaining: round_seconds,
            next_tick_at: None,
            round_seconds,
        }
    }

    /// Arm the countdown from `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        if self.seconds_remaining > 0 {
            self.next_tick_at = Some(now_ms + Self::INTERVAL_MS);
        }
    }

    /// Stop the countdown. Later polls do nothing.
    pub fn cancel(&mut self) {
        self.next_tick_at = None;
    }

    /// Full clock, cancelled.
    pub fn reset(&mut self) {
        *self = Self::new(self.round_seconds);
    }

    /// Whether the countdown is armed.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.next_tick_at.is_some()
    }

    /// Apply every decrement due by `now_ms`. Returns how many fired.
    pub fn poll(&mut self, now_ms: u64) -> u32 {
        let mut fired = 0;
        while let Some(at) = self.next_tick_at {
            if now_ms < at || self.seconds_remaining == 0 {
                break;
            }
            self.seconds_remaining -= 1;
            fired += 1;
            self.next_tick_at = if self.seconds_remaining > 0 {
                Some(at + Self::INTERVAL_MS)
            } else {
                None
            };
        }
        fired
    }

    /// Whether the clock has run out.
    #[inline]
    pub fn expired(&self) -> bool {
        self.seconds_remaining == 0
    }
}

// =============================================================================
// IMPACT FLASH
// =============================================================================

/// Cosmetic marker where the last hit landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    /// Centre of the attacker's attack box
    pub position: FixedVec2,
    /// Hidden from this time on (ms)
    pub until_ms: u64,
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// Render state for one fighter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FighterSnapshot {
    /// Player slot
    pub slot: PlayerSlot,
    /// Display name
    pub name: String,
    /// Left edge (px)
    pub x: f32,
    /// Top edge (px)
    pub y: f32,
    /// Health (0-100)
    pub health: u32,
    /// Knocked out
    pub dead: bool,
    /// Current pose
    pub pose: Pose,
    /// Sprite sheet row to draw
    pub frame_row: u32,
    /// Sprite sheet column to draw
    pub frame_column: u32,
    /// Facing the opponent on the right
    pub facing_right: bool,
    /// Attack window is live
    pub is_attacking: bool,
    /// Attack box as [x, y, width, height] (px)
    pub attack_box: [f32; 4],
}

/// Render state for the whole match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Frame ticks run so far
    pub tick: u32,
    /// Match phase
    pub phase: MatchPhase,
    /// Seconds left on the round clock
    pub timer_seconds: u32,
    /// Both fighters, indexed by slot
    pub fighters: [FighterSnapshot; 2],
    /// Result banner, once decided
    pub result: Option<MatchResult>,
    /// Impact flash position while visible (px)
    pub impact: Option<(f32, f32)>,
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Frame ticks run so far
    pub tick: u32,

    /// Current match phase
    pub phase: MatchPhase,

    /// Fighter registry, indexed by `PlayerSlot::index()`
    pub fighters: [Fighter; 2],

    /// Round countdown
    pub timer: RoundTimer,

    /// Decided result (set once per match)
    pub result: Option<MatchResult>,

    /// Cosmetic impact flash
    pub impact: Option<Impact>,

    /// Arena limits
    pub arena: ArenaBounds,

    /// Deadline lengths
    pub timing: TimingConfig,

    /// Clock reading of the last tick (ms)
    pub now_ms: u64,

    /// Events generated since the last drain
    pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Build a match from a validated config and link the two fighters.
    pub fn new(config: &MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut fighters = PlayerSlot::ALL.map(|slot| {
            Fighter::new(slot, config.fighter(slot).clone(), config.timing, config.hit_damage)
        });
        for fighter in &mut fighters {
            let enemy = fighter.slot.opponent();
            fighter.set_enemy(enemy)?;
        }

        Ok(Self {
            tick: 0,
            phase: MatchPhase::Waiting,
            fighters,
            timer: RoundTimer::new(config.round_seconds),
            result: None,
            impact: None,
            arena: config.arena.bounds(),
            timing: config.timing,
            now_ms: 0,
            pending_events: Vec::new(),
        })
    }

    /// Get a fighter.
    #[inline]
    pub fn fighter(&self, slot: PlayerSlot) -> &Fighter {
        &self.fighters[slot.index()]
    }

    /// Get a fighter mutably.
    #[inline]
    pub fn fighter_mut(&mut self, slot: PlayerSlot) -> &mut Fighter {
        &mut self.fighters[slot.index()]
    }

    /// Current x of the fighter's enemy, looked up through the registry.
    pub fn enemy_x(&self, slot: PlayerSlot) -> Option<Fixed> {
        self.fighter(slot)
            .enemy()
            .map(|enemy| self.fighter(enemy).position.x)
    }

    /// Whether the result has been decided.
    #[inline]
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended)
    }

    /// Begin the round: phase `Playing`, countdown armed from `now_ms`.
    /// Only valid from `Waiting`; returns false otherwise.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.phase != MatchPhase::Waiting {
            return false;
        }
        self.phase = MatchPhase::Playing;
        self.now_ms = now_ms;
        self.timer.start(now_ms);
        self.push_event(GameEvent::match_started(self.tick, now_ms, self.timer.seconds_remaining));
        info!(
            player1 = self.fighters[0].name(),
            player2 = self.fighters[1].name(),
            seconds = self.timer.seconds_remaining,
            "match started"
        );
        true
    }

    /// Restore the initial state of a freshly built match (phase `Waiting`,
    /// timer full and cancelled).
    pub fn reset(&mut self) {
        for fighter in &mut self.fighters {
            fighter.reset();
        }
        self.tick = 0;
        self.phase = MatchPhase::Waiting;
        self.timer.reset();
        self.result = None;
        self.impact = None;
        self.now_ms = 0;
        self.pending_events.clear();
    }

    /// Render snapshot.
    pub fn snapshot(&self) -> MatchSnapshot {
        let fighter_snapshot = |slot: PlayerSlot| {
            let f = self.fighter(slot);
            let b = f.attack_box;
            FighterSnapshot {
                slot,
                name: f.name().to_string(),
                x: to_float(f.position.x),
                y: to_float(f.position.y),
                health: f.health,
                dead: f.dead,
                pose: f.pose(),
                frame_row: f.animation.frame_row,
                frame_column: f.animation.frame_current,
                facing_right: f.facing_right(self.enemy_x(slot)),
                is_attacking: f.is_attacking,
                attack_box: [
                    to_float(b.position.x),
                    to_float(b.position.y),
                    to_float(b.width),
                    to_float(b.height),
                ],
            }
        };

        MatchSnapshot {
            tick: self.tick,
            phase: self.phase,
            timer_seconds: self.timer.seconds_remaining,
            fighters: PlayerSlot::ALL.map(fighter_snapshot),
            result: self.result,
            impact: self.impact.map(|i| i.position.to_floats()),
        }
    }

    /// Compute hash of the simulation state (cosmetic impact excluded).
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            hasher.update_u8(self.phase as u8);
            hasher.update_u32(self.timer.seconds_remaining);
            hasher.update_deadline(self.timer.next_tick_at);
            for fighter in &self.fighters {
                hash_fighter(fighter, hasher);
            }
            match self.result {
                Some(result) => {
                    hasher.update_u8(1);
                    hasher.update_u8(result.winner as u8);
                    hasher.update_u8(result.reason as u8);
                }
                None => hasher.update_u8(0),
            }
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

fn hash_fighter(fighter: &Fighter, hasher: &mut StateHasher) {
    hasher.update_u8(fighter.slot as u8);
    hasher.update_vec2(fighter.position);
    hasher.update_vec2(fighter.velocity);
    hasher.update_u32(fighter.health);
    hasher.update_bool(fighter.dead);
    hasher.update_vec2(fighter.attack_box.position);
    hasher.update_u8(fighter.animation.pose as u8);
    hasher.update_u32(fighter.animation.frame_current);
    hasher.update_u32(fighter.animation.frames_elapsed);
    hasher.update_bool(fighter.is_attacking);
    hasher.update_deadline(fighter.attacking_until);
    hasher.update_deadline(fighter.attack_hold_until);
    hasher.update_deadline(fighter.cooldown_until);
    hasher.update_deadline(fighter.hit_stun_until);
    hasher.update_bool(fighter.hit_facing_right);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::from_int;

    #[test]
    fn test_slot_opponent() {
        assert_eq!(PlayerSlot::Player1.opponent(), PlayerSlot::Player2);
        assert_eq!(PlayerSlot::Player2.opponent(), PlayerSlot::Player1);
        assert_eq!(PlayerSlot::Player2.index(), 1);
    }

    #[test]
    fn test_winner_by_health() {
        assert_eq!(Winner::by_health(40, 60), Winner::Player2);
        assert_eq!(Winner::by_health(70, 0), Winner::Player1);
        assert_eq!(Winner::by_health(50, 50), Winner::Draw);
        assert_eq!(Winner::Draw.slot(), None);
    }

    #[test]
    fn test_round_timer_countdown() {
        let mut timer = RoundTimer::new(3);
        assert_eq!(timer.poll(5000), 0, "not started");

        timer.start(0);
        assert_eq!(timer.poll(999), 0);
        assert_eq!(timer.poll(1000), 1);
        assert_eq!(timer.seconds_remaining, 2);

        // Late poll catches up
        assert_eq!(timer.poll(3500), 2);
        assert!(timer.expired());
        assert!(!timer.is_running());
        assert_eq!(timer.poll(10_000), 0);
    }

    #[test]
    fn test_round_timer_cancel_and_reset() {
        let mut timer = RoundTimer::new(60);
        timer.start(0);
        timer.poll(2000);
        timer.cancel();
        assert_eq!(timer.poll(9000), 0);
        assert_eq!(timer.seconds_remaining, 58);

        timer.reset();
        assert_eq!(timer, RoundTimer::new(60));
    }

    #[test]
    fn test_match_state_links_enemies() {
        let state = MatchState::new(&MatchConfig::default()).unwrap();
        assert_eq!(state.fighter(PlayerSlot::Player1).enemy(), Some(PlayerSlot::Player2));
        assert_eq!(state.fighter(PlayerSlot::Player2).enemy(), Some(PlayerSlot::Player1));
        assert_eq!(state.enemy_x(PlayerSlot::Player1), Some(from_int(800)));
        assert_eq!(state.phase, MatchPhase::Waiting);
        assert_eq!(state.timer.seconds_remaining, 60);
    }

    #[test]
    fn test_match_state_rejects_bad_config() {
        let mut config = MatchConfig::default();
        config.round_seconds = 0;
        assert!(MatchState::new(&config).is_err());
    }

    #[test]
    fn test_start_arms_timer_once() {
        let mut state = MatchState::new(&MatchConfig::default()).unwrap();
        assert!(state.start(5000));
        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.timer.next_tick_at, Some(6000));
        assert!(!state.start(7000));
        assert_eq!(state.timer.next_tick_at, Some(6000));

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at_ms, 5000);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let config = MatchConfig::default();
        let fresh = MatchState::new(&config).unwrap();
        let mut state = MatchState::new(&config).unwrap();
        state.start(0);
        state.timer.poll(3000);
        state.fighter_mut(PlayerSlot::Player1).take_hit(100, true);
        state.tick = 40;

        state.reset();
        assert_eq!(state.compute_hash(), fresh.compute_hash());
        assert_eq!(state.fighters, fresh.fighters);
        assert_eq!(state.timer, fresh.timer);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_hash_tracks_fighter_state() {
        let config = MatchConfig::default();
        let a = MatchState::new(&config).unwrap();
        let mut b = MatchState::new(&config).unwrap();
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.fighter_mut(PlayerSlot::Player2).health = 90;
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_snapshot_reports_render_state() {
        let state = MatchState::new(&MatchConfig::default()).unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.timer_seconds, 60);
        assert_eq!(snap.fighters[0].x, 150.0);
        assert_eq!(snap.fighters[1].x, 800.0);
        assert!(snap.fighters[0].facing_right);
        assert!(!snap.fighters[1].facing_right);
        assert_eq!(snap.fighters[0].pose, Pose::Idle);
        assert_eq!(snap.impact, None);
    }
}
