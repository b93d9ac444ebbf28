//! Match Configuration
//!
//! Arena geometry, timing windows, and per-fighter sprite layouts.
//! Pixel and millisecond values are plain numbers here; they become
//! fixed-point only when a match is built.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::{Fixed, from_int};
use crate::core::vec2::FixedVec2;
use crate::game::fighter::{Fighter, FighterError, Pose};
use crate::game::state::PlayerSlot;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Arena cannot hold a fighter.
    #[error("arena width {width} is narrower than a fighter ({fighter_width})")]
    ArenaTooNarrow {
        /// Configured arena width (px)
        width: i32,
        /// Fighter body width (px)
        fighter_width: i32,
    },

    /// Floor leaves no room for a standing fighter.
    #[error("arena height {height} minus floor {floor} cannot fit a fighter ({fighter_height})")]
    ArenaTooShort {
        /// Configured arena height (px)
        height: i32,
        /// Configured floor strip height (px)
        floor: i32,
        /// Fighter body height (px)
        fighter_height: i32,
    },

    /// Spawn point outside the arena.
    #[error("spawn point for {slot:?} at x={x} is outside the arena")]
    SpawnOutOfBounds {
        /// Offending player
        slot: PlayerSlot,
        /// Configured spawn x (px)
        x: i32,
    },

    /// Spawn point above the canvas or with feet below the ground.
    #[error("spawn point for {slot:?} at y={y} does not fit above the ground ({ground})")]
    SpawnOffGround {
        /// Offending player
        slot: PlayerSlot,
        /// Configured spawn y (px)
        y: i32,
        /// Ground line (px)
        ground: i32,
    },

    /// Animation would never advance.
    #[error("frames_hold must be at least 1")]
    ZeroFramesHold,

    /// A pose declares zero frames.
    #[error("pose {0:?} declares zero frames")]
    EmptyPose(Pose),

    /// Round would end before it starts.
    #[error("round must last at least one second")]
    ZeroRoundLength,

    /// Frame interval must be positive.
    #[error("frame interval must be at least 1 ms")]
    ZeroFrameInterval,

    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Fighters could not be linked.
    #[error("fighter wiring failed: {0}")]
    Wiring(#[from] FighterError),
}

// =============================================================================
// ARENA
// =============================================================================

/// Arena (canvas) geometry in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Canvas width
    pub width: i32,
    /// Canvas height
    pub height: i32,
    /// Height of the floor strip at the bottom of the canvas
    pub floor_height: i32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 576,
            floor_height: 94,
        }
    }
}

impl ArenaConfig {
    /// Fixed-point bounds used by the simulation.
    pub fn bounds(&self) -> ArenaBounds {
        ArenaBounds {
            width: from_int(self.width),
            ground_level: from_int(self.height - self.floor_height),
        }
    }
}

/// Arena limits in simulation units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaBounds {
    /// Right edge of the arena
    pub width: Fixed,
    /// Ground line (fighters' feet rest here)
    pub ground_level: Fixed,
}

// =============================================================================
// TIMING
// =============================================================================

/// Deadline lengths in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Attack pose is guaranteed for this long after `attack()`
    pub attack_hold_ms: u64,
    /// Window during which the attack can register a hit
    pub attack_active_ms: u64,
    /// Minimum time between two attacks
    pub attack_cooldown_ms: u64,
    /// Hit reaction lock after taking damage
    pub hit_stun_ms: u64,
    /// Lifetime of the cosmetic impact flash
    pub impact_flash_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            attack_hold_ms: 180,
            attack_active_ms: 500,
            attack_cooldown_ms: 800,
            hit_stun_ms: 320,
            impact_flash_ms: 120,
        }
    }
}

// =============================================================================
// SPRITES
// =============================================================================

/// Location of one pose on a sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseFrames {
    /// Sheet row
    pub row: u32,
    /// First column of the cycle
    pub col: u32,
    /// Number of frames in the cycle
    #[serde(default = "one_frame")]
    pub frames: u32,
}

fn one_frame() -> u32 {
    1
}

impl PoseFrames {
    /// Single-frame pose at (row, col).
    pub const fn still(row: u32, col: u32) -> Self {
        Self { row, col, frames: 1 }
    }
}

/// Poses a fighter's sheet defines. Missing poses are skipped on switch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteSet {
    poses: BTreeMap<Pose, PoseFrames>,
}

impl SpriteSet {
    /// Empty set (fighter keeps its initial frame forever).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, pose: Pose, frames: PoseFrames) -> Self {
        self.poses.insert(pose, frames);
        self
    }

    /// 2x2 sheet used by both stock fighters.
    pub fn two_by_two() -> Self {
        Self::new()
            .with(Pose::Idle, PoseFrames::still(0, 0))
            .with(Pose::Run, PoseFrames::still(0, 0))
            .with(Pose::Jump, PoseFrames::still(0, 0))
            .with(Pose::Fall, PoseFrames::still(0, 0))
            .with(Pose::Attack, PoseFrames::still(0, 1))
            .with(Pose::Attack2, PoseFrames::still(1, 0))
            .with(Pose::TakeHit, PoseFrames::still(1, 1))
    }

    /// Look up a pose.
    pub fn get(&self, pose: Pose) -> Option<&PoseFrames> {
        self.poses.get(&pose)
    }

    /// Whether the sheet defines a pose.
    pub fn has(&self, pose: Pose) -> bool {
        self.poses.contains_key(&pose)
    }

    fn iter(&self) -> impl Iterator<Item = (&Pose, &PoseFrames)> {
        self.poses.iter()
    }
}

// =============================================================================
// FIGHTER
// =============================================================================

/// Per-fighter configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterConfig {
    /// Display name used in logs and results
    pub name: String,
    /// Spawn x (px)
    pub spawn_x: i32,
    /// Spawn y (px), usually above ground so the fighter drops in
    pub spawn_y: i32,
    /// Attack box offset from the fighter's leading edge (px)
    pub attack_offset_x: i32,
    /// Attack box offset from the fighter's top edge (px)
    pub attack_offset_y: i32,
    /// Ticks each animation frame is held
    pub frames_hold: u32,
    /// Sprite sheet layout
    pub sprites: SpriteSet,
}

impl FighterConfig {
    /// Stock fighter with the default 2x2 sheet.
    pub fn stock(name: &str, spawn_x: i32) -> Self {
        Self {
            name: name.to_string(),
            spawn_x,
            spawn_y: 20,
            attack_offset_x: 20,
            attack_offset_y: 50,
            frames_hold: 5,
            sprites: SpriteSet::two_by_two(),
        }
    }

    /// Spawn position in simulation units.
    pub fn spawn(&self) -> FixedVec2 {
        FixedVec2::from_ints(self.spawn_x, self.spawn_y)
    }

    /// Attack box offset in simulation units.
    pub fn attack_offset(&self) -> FixedVec2 {
        FixedVec2::from_ints(self.attack_offset_x, self.attack_offset_y)
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// Complete match configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Arena geometry
    pub arena: ArenaConfig,
    /// Deadline lengths
    pub timing: TimingConfig,
    /// Round length in seconds
    pub round_seconds: u32,
    /// Health removed per landed hit
    pub hit_damage: u32,
    /// Frame interval for the driver and for replays (ms)
    pub frame_interval_ms: u64,
    /// Driver speed-up factor (1 = real time)
    pub time_scale: u32,
    /// Player 1
    pub player1: FighterConfig,
    /// Player 2
    pub player2: FighterConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            timing: TimingConfig::default(),
            round_seconds: 60,
            hit_damage: 10,
            frame_interval_ms: 16,
            time_scale: 1,
            player1: FighterConfig::stock("Michael Morales", 150),
            player2: FighterConfig::stock("Chito Vera", 800),
        }
    }
}

impl MatchConfig {
    /// Parse a JSON config. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Config for one player slot.
    pub fn fighter(&self, slot: PlayerSlot) -> &FighterConfig {
        match slot {
            PlayerSlot::Player1 => &self.player1,
            PlayerSlot::Player2 => &self.player2,
        }
    }

    /// Reject configs the simulation cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let width = Fighter::WIDTH_PX;
        let height = Fighter::HEIGHT_PX;
        let ground = self.arena.height - self.arena.floor_height;

        if self.arena.width < width {
            return Err(ConfigError::ArenaTooNarrow {
                width: self.arena.width,
                fighter_width: width,
            });
        }
        if ground < height {
            return Err(ConfigError::ArenaTooShort {
                height: self.arena.height,
                floor: self.arena.floor_height,
                fighter_height: height,
            });
        }
        if self.round_seconds == 0 {
            return Err(ConfigError::ZeroRoundLength);
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::ZeroFrameInterval);
        }

        for slot in PlayerSlot::ALL {
            let fighter = self.fighter(slot);
            if fighter.spawn_x < 0 || fighter.spawn_x > self.arena.width - width {
                return Err(ConfigError::SpawnOutOfBounds { slot, x: fighter.spawn_x });
            }
            if fighter.spawn_y < 0 || fighter.spawn_y + height > ground {
                return Err(ConfigError::SpawnOffGround { slot, y: fighter.spawn_y, ground });
            }
            if fighter.frames_hold == 0 {
                return Err(ConfigError::ZeroFramesHold);
            }
            if let Some((pose, _)) = fighter.sprites.iter().find(|(_, f)| f.frames == 0) {
                return Err(ConfigError::EmptyPose(*pose));
            }
        }

        Ok(())
    }
}
