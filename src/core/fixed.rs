//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the match simulation.
//! Positions, velocities and gravity are all integer arithmetic, so two
//! runs fed the same inputs land on bit-identical states.
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 (approx)                   │
//! │  Precision: 1/65536 ≈ 0.000015 px                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The arena is 1024 px wide, so the 32k pixel range leaves plenty of room.

/// Q16.16 fixed-point number stored as i32.
/// 16 bits integer, 16 bits fractional.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE; // 65536

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1; // 32768

// =============================================================================
// GAME CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Gravity acceleration per tick: 0.7 px = floor(0.7 * 65536) = 45875
pub const GRAVITY: Fixed = 45875;

/// Horizontal run speed: 5.0 px/tick = 5 * 65536 = 327680
pub const RUN_SPEED: Fixed = 327680;

/// Jump impulse: -20.0 px/tick (screen y grows downward)
pub const JUMP_VELOCITY: Fixed = -1310720;

/// Maximum push per fighter per tick: 6.0 px
pub const PUSH_MAX: Fixed = 393216;

/// Overlap above which fighters are separated even without closing speed: 20.0 px
pub const PUSH_OVERLAP_THRESHOLD: Fixed = 1310720;

/// Distance from ground rest height that still counts as grounded for pushing: 10.0 px
pub const GROUND_TOLERANCE: Fixed = 655360;

/// Distance from the ground line within which a jump may start: 1.0 px
pub const JUMP_TOLERANCE: Fixed = FIXED_ONE;

// =============================================================================
// CORE OPERATIONS (All deterministic, wrapping semantics)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in tick loop.
///
/// # Example
/// ```
/// use fight_night::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert an integer pixel count to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(FIXED_SCALE, 16);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
        assert_eq!(from_int(80), to_fixed(80.0));
    }

    #[test]
    fn test_game_constants() {
        assert_eq!(GRAVITY, to_fixed(0.7));
        assert_eq!(RUN_SPEED, from_int(5));
        assert_eq!(JUMP_VELOCITY, from_int(-20));
        assert_eq!(PUSH_MAX, from_int(6));
        assert_eq!(PUSH_OVERLAP_THRESHOLD, from_int(20));
        assert_eq!(GROUND_TOLERANCE, from_int(10));
    }

    #[test]
    fn test_fixed_clamp() {
        let lo = from_int(0);
        let hi = from_int(944);
        assert_eq!(fixed_clamp(from_int(-3), lo, hi), lo);
        assert_eq!(fixed_clamp(from_int(950), lo, hi), hi);
        assert_eq!(fixed_clamp(from_int(500), lo, hi), from_int(500));
        assert_eq!(fixed_abs(from_int(-7)), from_int(7));
    }
}
