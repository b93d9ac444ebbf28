//! Fighter Simulation
//!
//! One combatant: physics integration, the pose state machine, attack and
//! hit-stun windows, and the attack box.
//!
//! ## Pose priority (evaluated every tick, highest first)
//!
//! ```text
//! 1. takeHit   held until the hit-stun deadline passes (frozen once dead)
//! 2. attack    while the hold window is open or the attack is active
//! 3. jump      velocity.y < 0
//! 4. fall      velocity.y > 0
//! 5. run       velocity.x != 0
//! 6. idle
//! ```
//!
//! All windows are absolute deadlines in milliseconds against the clock the
//! controller passes in, so nothing scheduled by one match can leak into the
//! next after a reset.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::fixed::{Fixed, GRAVITY, from_int};
use crate::core::vec2::FixedVec2;
use crate::game::config::{ArenaBounds, FighterConfig, PoseFrames, TimingConfig};
use crate::game::state::PlayerSlot;

/// Full health.
pub const MAX_HEALTH: u32 = 100;

/// Fighter wiring errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FighterError {
    /// A fighter cannot be its own enemy.
    #[error("{0:?} cannot target itself")]
    SelfEnemy(PlayerSlot),

    /// The enemy link is set once and never reassigned.
    #[error("{slot:?} already targets {current:?}")]
    EnemyAlreadySet {
        /// Fighter being linked
        slot: PlayerSlot,
        /// Enemy it already targets
        current: PlayerSlot,
    },
}

// =============================================================================
// POSE
// =============================================================================

/// Named animation/behavior state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pose {
    /// Standing still on the ground
    Idle = 0,
    /// Moving horizontally on the ground
    Run = 1,
    /// Rising
    Jump = 2,
    /// Descending
    Fall = 3,
    /// First attack swing
    Attack = 4,
    /// Alternate attack swing
    Attack2 = 5,
    /// Hit reaction
    TakeHit = 6,
}

impl Pose {
    /// Whether this is one of the attack poses.
    #[inline]
    pub fn is_attack(self) -> bool {
        matches!(self, Pose::Attack | Pose::Attack2)
    }
}

// =============================================================================
// ANIMATION
// =============================================================================

/// Sprite cursor for the current pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    /// Active pose
    pub pose: Pose,
    /// Sheet row of the active pose
    pub frame_row: u32,
    /// First column of the cycle
    pub start_frame: u32,
    /// Frames in the cycle
    pub frames_max: u32,
    /// Current column
    pub frame_current: u32,
    /// Ticks since the pose was entered
    pub frames_elapsed: u32,
}

impl AnimationState {
    fn enter(pose: Pose, frames: PoseFrames) -> Self {
        Self {
            pose,
            frame_row: frames.row,
            start_frame: frames.col,
            frames_max: frames.frames.max(1),
            frame_current: frames.col,
            frames_elapsed: 0,
        }
    }

    /// Last column of the cycle.
    #[inline]
    pub fn end_frame(&self) -> u32 {
        self.start_frame + self.frames_max - 1
    }

    /// Count one tick; every `hold` ticks step to the next frame, wrapping.
    fn advance(&mut self, hold: u32) {
        self.frames_elapsed += 1;
        if self.frames_elapsed % hold.max(1) == 0 {
            if self.frame_current < self.end_frame() {
                self.frame_current += 1;
            } else {
                self.frame_current = self.start_frame;
            }
        }
    }
}

// =============================================================================
// ATTACK BOX
// =============================================================================

/// Reach rectangle of a fighter's strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackBox {
    /// Top-left corner
    pub position: FixedVec2,
    /// Offset from the fighter's leading/top edge
    pub offset: FixedVec2,
    /// Width
    pub width: Fixed,
    /// Height
    pub height: Fixed,
}

// =============================================================================
// UPDATE CONTEXT
// =============================================================================

/// What a fighter needs from the outside world for one update.
#[derive(Clone, Copy, Debug)]
pub struct UpdateContext {
    /// Clock reading for this tick (ms)
    pub now_ms: u64,
    /// Enemy's current x, if linked
    pub enemy_x: Option<Fixed>,
    /// Arena limits
    pub arena: ArenaBounds,
}

// =============================================================================
// FIGHTER
// =============================================================================

/// One combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fighter {
    /// Which player controls this fighter
    pub slot: PlayerSlot,
    /// Top-left corner of the body box
    pub position: FixedVec2,
    /// Per-tick displacement
    pub velocity: FixedVec2,
    /// Body width
    pub width: Fixed,
    /// Body height
    pub height: Fixed,
    /// Remaining health, 0..=100
    pub health: u32,
    /// Latched once health reaches 0
    pub dead: bool,
    /// Strike reach
    pub attack_box: AttackBox,
    /// Sprite cursor
    pub animation: AnimationState,
    /// An attack is live and may still land
    pub is_attacking: bool,
    /// Active-hit window deadline
    pub attacking_until: Option<u64>,
    /// Attack pose guaranteed until
    pub attack_hold_until: Option<u64>,
    /// No new attack before
    pub cooldown_until: Option<u64>,
    /// takeHit pose locked until
    pub hit_stun_until: Option<u64>,
    /// Facing captured when the last hit landed
    pub hit_facing_right: bool,
    /// Pose used by the current/last attack
    pub attack_pose: Pose,
    alternate_next_attack: bool,
    enemy: Option<PlayerSlot>,
    config: FighterConfig,
    timing: TimingConfig,
    damage_taken_per_hit: u32,
}

impl Fighter {
    /// Body width in pixels.
    pub const WIDTH_PX: i32 = 80;
    /// Body height in pixels.
    pub const HEIGHT_PX: i32 = 220;
    /// Attack box width in pixels.
    pub const ATTACK_WIDTH_PX: i32 = 150;
    /// Attack box height in pixels.
    pub const ATTACK_HEIGHT_PX: i32 = 50;

    /// Create a fighter at its spawn point with full health.
    pub fn new(slot: PlayerSlot, config: FighterConfig, timing: TimingConfig, hit_damage: u32) -> Self {
        let position = config.spawn();
        let animation = match config.sprites.get(Pose::Idle) {
            Some(frames) => AnimationState::enter(Pose::Idle, *frames),
            None => AnimationState::enter(Pose::Idle, PoseFrames::still(0, 0)),
        };

        let mut fighter = Self {
            slot,
            position,
            velocity: FixedVec2::ZERO,
            width: from_int(Self::WIDTH_PX),
            height: from_int(Self::HEIGHT_PX),
            health: MAX_HEALTH,
            dead: false,
            attack_box: AttackBox {
                position,
                offset: config.attack_offset(),
                width: from_int(Self::ATTACK_WIDTH_PX),
                height: from_int(Self::ATTACK_HEIGHT_PX),
            },
            animation,
            is_attacking: false,
            attacking_until: None,
            attack_hold_until: None,
            cooldown_until: None,
            hit_stun_until: None,
            hit_facing_right: true,
            attack_pose: Pose::Attack,
            alternate_next_attack: false,
            enemy: None,
            config,
            timing,
            damage_taken_per_hit: hit_damage,
        };
        fighter.refresh_attack_box(None);
        fighter
    }

    /// Restore spawn state. The enemy link survives.
    pub fn reset(&mut self) {
        let enemy = self.enemy;
        *self = Self::new(self.slot, self.config.clone(), self.timing, self.damage_taken_per_hit);
        self.enemy = enemy;
    }

    /// Link the opposing fighter. Set once; repeating the same link is fine.
    pub fn set_enemy(&mut self, enemy: PlayerSlot) -> Result<(), FighterError> {
        if enemy == self.slot {
            return Err(FighterError::SelfEnemy(self.slot));
        }
        match self.enemy {
            Some(current) if current != enemy => {
                warn!(slot = ?self.slot, ?current, "enemy already assigned");
                Err(FighterError::EnemyAlreadySet { slot: self.slot, current })
            }
            _ => {
                self.enemy = Some(enemy);
                Ok(())
            }
        }
    }

    /// The linked enemy slot.
    #[inline]
    pub fn enemy(&self) -> Option<PlayerSlot> {
        self.enemy
    }

    /// Display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current pose.
    #[inline]
    pub fn pose(&self) -> Pose {
        self.animation.pose
    }

    /// Facing derived from relative position; frozen while in `takeHit`.
    pub fn facing_right(&self, enemy_x: Option<Fixed>) -> bool {
        if self.animation.pose == Pose::TakeHit {
            return self.hit_facing_right;
        }
        enemy_x.is_none_or(|ex| self.position.x < ex)
    }

    /// Whether the cooldown window is still open.
    #[inline]
    pub fn is_cooling_down(&self, now_ms: u64) -> bool {
        self.cooldown_until.is_some_and(|until| now_ms < until)
    }

    /// Whether the attack hold window is still open.
    #[inline]
    pub fn is_holding_attack(&self, now_ms: u64) -> bool {
        self.attack_hold_until.is_some_and(|until| now_ms < until)
    }

    /// Whether hit-stun is still running.
    #[inline]
    pub fn is_stunned(&self, now_ms: u64) -> bool {
        self.hit_stun_until.is_some_and(|until| now_ms < until)
    }

    /// Feet are within `tolerance` of the ground line.
    #[inline]
    pub fn is_near_ground(&self, ground_level: Fixed, tolerance: Fixed) -> bool {
        self.position.y + self.height >= ground_level - tolerance
    }

    /// Start an attack. Returns false (and changes nothing) if dead, already
    /// attacking, or cooling down.
    pub fn attack(&mut self, now_ms: u64) -> bool {
        if self.dead || self.is_attacking || self.is_cooling_down(now_ms) {
            return false;
        }

        let has_alternate = self.config.sprites.has(Pose::Attack2);
        let pose = if has_alternate && self.alternate_next_attack {
            Pose::Attack2
        } else {
            Pose::Attack
        };
        if has_alternate {
            self.alternate_next_attack = !self.alternate_next_attack;
        }
        self.attack_pose = pose;

        // takeHit outranks the attack pose; the attack still goes live.
        if self.animation.pose != Pose::TakeHit {
            self.switch_pose(pose);
        }

        self.attack_hold_until = Some(now_ms + self.timing.attack_hold_ms);
        self.is_attacking = true;
        self.attacking_until = Some(now_ms + self.timing.attack_active_ms);
        self.cooldown_until = Some(now_ms + self.timing.attack_cooldown_ms);

        debug!(slot = ?self.slot, ?pose, now_ms, "attack started");
        true
    }

    /// Apply one hit. No-op on a dead fighter.
    pub fn take_hit(&mut self, now_ms: u64, facing_right: bool) {
        if self.dead {
            return;
        }

        self.health = self.health.saturating_sub(self.damage_taken_per_hit);

        if self.config.sprites.has(Pose::TakeHit) {
            self.hit_facing_right = facing_right;
            self.switch_pose(Pose::TakeHit);
        }
        self.hit_stun_until = Some(now_ms + self.timing.hit_stun_ms);

        if self.health == 0 {
            self.dead = true;
            debug!(slot = ?self.slot, "knocked out");
        }
    }

    /// Advance one tick: deadlines, animation, pose, physics, attack box.
    pub fn update(&mut self, ctx: &UpdateContext) {
        self.expire_windows(ctx.now_ms);

        if !self.dead {
            self.animation.advance(self.config.frames_hold);
            self.resolve_pose(ctx.now_ms);
        }

        self.integrate(ctx.arena);
        self.refresh_attack_box(ctx.enemy_x);
    }

    /// Switch pose. Same pose or a pose the sheet lacks is a no-op.
    pub fn switch_pose(&mut self, pose: Pose) {
        let Some(frames) = self.config.sprites.get(pose) else {
            return;
        };
        if self.animation.pose == pose {
            return;
        }
        self.animation = AnimationState::enter(pose, *frames);
    }

    /// Recompute the attack box from position and facing.
    pub fn refresh_attack_box(&mut self, enemy_x: Option<Fixed>) {
        let facing_right = self.facing_right(enemy_x);
        let b = &mut self.attack_box;
        b.position.x = if facing_right {
            self.position.x + b.offset.x
        } else {
            self.position.x - b.width + self.width - b.offset.x
        };
        b.position.y = self.position.y + b.offset.y;
    }

    fn expire_windows(&mut self, now_ms: u64) {
        if self.attacking_until.is_some_and(|until| now_ms >= until) {
            self.attacking_until = None;
            self.is_attacking = false;
        }
        if self.attack_hold_until.is_some_and(|until| now_ms >= until) {
            self.attack_hold_until = None;
        }
        if self.cooldown_until.is_some_and(|until| now_ms >= until) {
            self.cooldown_until = None;
        }
    }

    fn resolve_pose(&mut self, now_ms: u64) {
        if self.animation.pose == Pose::TakeHit {
            if self.health > 0 && !self.is_stunned(now_ms) {
                self.hit_stun_until = None;
                self.switch_pose(Pose::Idle);
            }
            return;
        }

        let next = if self.is_holding_attack(now_ms) || self.is_attacking {
            self.attack_pose
        } else if self.velocity.y < 0 {
            Pose::Jump
        } else if self.velocity.y > 0 {
            Pose::Fall
        } else if self.velocity.x != 0 {
            Pose::Run
        } else {
            Pose::Idle
        };
        self.switch_pose(next);
    }

    fn integrate(&mut self, arena: ArenaBounds) {
        self.position = self.position + self.velocity;

        if self.position.y + self.height + self.velocity.y >= arena.ground_level {
            self.velocity.y = 0;
            self.position.y = arena.ground_level - self.height;
        } else {
            self.velocity.y += GRAVITY;
        }

        if self.position.x < 0 {
            self.position.x = 0;
        }
        if self.position.x + self.width > arena.width {
            self.position.x = arena.width - self.width;
        }
    }
}
