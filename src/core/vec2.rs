//! Fixed-Point 2D Vector
//!
//! Screen-space vector for fighter positions and velocities.
//! `x` grows to the right, `y` grows downward (canvas convention).

use std::fmt;
use std::ops::{Add, Sub};
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_SCALE, to_float};

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point)
    pub y: Fixed,
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer pixel components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
        }
    }

    /// Convert to float tuple for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (to_float(self.x), to_float(self.y))
    }
}

impl Add for FixedVec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        FixedVec2::add(self, rhs)
    }
}

impl Sub for FixedVec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        FixedVec2::sub(self, rhs)
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "Vec2({:.3}, {:.3})", fx, fy)
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "({:.1}, {:.1})", fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, to_fixed};

    #[test]
    fn test_vec2_from_ints() {
        let v = FixedVec2::from_ints(150, 20);
        assert_eq!(v.x, from_int(150));
        assert_eq!(v.y, from_int(20));
    }

    #[test]
    fn test_vec2_add_sub() {
        let a = FixedVec2::from_ints(3, 4);
        let b = FixedVec2::from_ints(1, 2);
        assert_eq!(a + b, FixedVec2::from_ints(4, 6));
        assert_eq!(a - b, FixedVec2::from_ints(2, 2));
    }

    #[test]
    fn test_vec2_to_floats() {
        let v = FixedVec2::new(to_fixed(0.5), to_fixed(-2.0));
        assert_eq!(v.to_floats(), (0.5, -2.0));
        assert_eq!(format!("{}", v), "(0.5, -2.0)");
    }
}
