//! Collision Detection
//!
//! Axis-aligned box tests between fighters: attack box against body for
//! damage, body against body for the ground push.

use crate::core::fixed::{
    Fixed, GROUND_TOLERANCE, PUSH_MAX, PUSH_OVERLAP_THRESHOLD,
    fixed_max, fixed_min,
};
use crate::game::fighter::Fighter;

/// Axis-aligned rectangle (top-left corner plus size).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left edge
    pub x: Fixed,
    /// Top edge
    pub y: Fixed,
    /// Width
    pub width: Fixed,
    /// Height
    pub height: Fixed,
}

impl Rect {
    /// A fighter's body box.
    #[inline]
    pub fn body(fighter: &Fighter) -> Self {
        Self {
            x: fighter.position.x,
            y: fighter.position.y,
            width: fighter.width,
            height: fighter.height,
        }
    }

    /// A fighter's attack box.
    #[inline]
    pub fn attack(fighter: &Fighter) -> Self {
        let b = &fighter.attack_box;
        Self {
            x: b.position.x,
            y: b.position.y,
            width: b.width,
            height: b.height,
        }
    }

    #[inline]
    fn right(&self) -> Fixed {
        self.x + self.width
    }

    #[inline]
    fn bottom(&self) -> Fixed {
        self.y + self.height
    }

    /// Edges touching counts as contact.
    #[inline]
    pub fn touches(&self, other: &Rect) -> bool {
        self.right() >= other.x
            && self.x <= other.right()
            && self.bottom() >= other.y
            && self.y <= other.bottom()
    }

    /// Horizontal overlap width, if the x spans strictly overlap.
    #[inline]
    pub fn horizontal_overlap(&self, other: &Rect) -> Option<Fixed> {
        if self.right() > other.x && self.x < other.right() {
            Some(fixed_min(self.right(), other.right()) - fixed_max(self.x, other.x))
        } else {
            None
        }
    }
}

/// Whether `attacker`'s live attack reaches `defender`.
///
/// Requires an active attack and a living defender.
pub fn attack_connects(attacker: &Fighter, defender: &Fighter) -> bool {
    attacker.is_attacking
        && !defender.dead
        && Rect::attack(attacker).touches(&Rect::body(defender))
}

/// Separation for two grounded fighters whose bodies overlap.
///
/// Returns the x displacement to apply to `a` and `b`. Airborne fighters
/// pass through each other. A light overlap only separates while the two
/// are walking into each other.
pub fn compute_push(a: &Fighter, b: &Fighter, ground_level: Fixed) -> Option<(Fixed, Fixed)> {
    if !a.is_near_ground(ground_level, GROUND_TOLERANCE)
        || !b.is_near_ground(ground_level, GROUND_TOLERANCE)
    {
        return None;
    }

    let body_a = Rect::body(a);
    let body_b = Rect::body(b);
    let overlap = body_a.horizontal_overlap(&body_b)?;

    let moving_towards = (a.velocity.x > 0 && b.velocity.x < 0)
        || (b.velocity.x > 0 && a.velocity.x < 0);
    if !moving_towards && overlap <= PUSH_OVERLAP_THRESHOLD {
        return None;
    }

    let push = fixed_min(PUSH_MAX, overlap / 2);
    // Centres compare like left edges since both bodies share a width.
    let a_centre = body_a.x * 2 + body_a.width;
    let b_centre = body_b.x * 2 + body_b.width;
    if a_centre < b_centre {
        Some((-push, push))
    } else {
        Some((push, -push))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::from_int;
    use crate::game::config::{ArenaConfig, MatchConfig};
    use crate::game::state::PlayerSlot;

    const GROUND_Y: i32 = 482 - 220;

    fn ground() -> Fixed {
        ArenaConfig::default().bounds().ground_level
    }

    fn fighter_at(slot: PlayerSlot, x: i32, y: i32) -> Fighter {
        let config = MatchConfig::default();
        let mut f = Fighter::new(slot, config.fighter(slot).clone(), config.timing, config.hit_damage);
        f.position.x = from_int(x);
        f.position.y = from_int(y);
        f
    }

    #[test]
    fn test_rect_touch_is_inclusive() {
        let a = Rect { x: 0, y: 0, width: from_int(10), height: from_int(10) };
        let b = Rect { x: from_int(10), y: from_int(10), width: from_int(5), height: from_int(5) };
        assert!(a.touches(&b));
        assert_eq!(a.horizontal_overlap(&b), None);

        let c = Rect { x: from_int(11), ..b };
        assert!(!a.touches(&c));
    }

    #[test]
    fn test_attack_connects_in_reach() {
        let mut attacker = fighter_at(PlayerSlot::Player1, 150, GROUND_Y);
        let defender = fighter_at(PlayerSlot::Player2, 270, GROUND_Y);
        attacker.refresh_attack_box(Some(defender.position.x));

        assert!(!attack_connects(&attacker, &defender), "no live attack");
        attacker.attack(0);
        assert!(attack_connects(&attacker, &defender));
    }

    #[test]
    fn test_attack_misses_out_of_reach() {
        let mut attacker = fighter_at(PlayerSlot::Player1, 100, GROUND_Y);
        let defender = fighter_at(PlayerSlot::Player2, 900, GROUND_Y);
        attacker.refresh_attack_box(Some(defender.position.x));
        attacker.attack(0);
        assert!(!attack_connects(&attacker, &defender));
    }

    #[test]
    fn test_attack_ignores_dead_defender() {
        let mut attacker = fighter_at(PlayerSlot::Player1, 150, GROUND_Y);
        let mut defender = fighter_at(PlayerSlot::Player2, 270, GROUND_Y);
        attacker.refresh_attack_box(Some(defender.position.x));
        attacker.attack(0);
        defender.health = 0;
        defender.dead = true;
        assert!(!attack_connects(&attacker, &defender));
    }

    #[test]
    fn test_push_when_walking_into_each_other() {
        let mut a = fighter_at(PlayerSlot::Player1, 400, GROUND_Y);
        let mut b = fighter_at(PlayerSlot::Player2, 470, GROUND_Y);
        a.velocity.x = from_int(5);
        b.velocity.x = from_int(-5);

        // overlap 10 -> push 5 each
        assert_eq!(compute_push(&a, &b, ground()), Some((from_int(-5), from_int(5))));
    }

    #[test]
    fn test_push_capped() {
        let a = fighter_at(PlayerSlot::Player1, 440, GROUND_Y);
        let b = fighter_at(PlayerSlot::Player2, 400, GROUND_Y);
        // overlap 40 > 20, b is left of a
        assert_eq!(compute_push(&a, &b, ground()), Some((PUSH_MAX, -PUSH_MAX)));
    }

    #[test]
    fn test_light_overlap_standing_still() {
        let a = fighter_at(PlayerSlot::Player1, 400, GROUND_Y);
        let b = fighter_at(PlayerSlot::Player2, 465, GROUND_Y);
        assert_eq!(compute_push(&a, &b, ground()), None);
    }

    #[test]
    fn test_airborne_fighters_pass_through() {
        let mut a = fighter_at(PlayerSlot::Player1, 400, 100);
        let mut b = fighter_at(PlayerSlot::Player2, 420, 100);
        a.velocity.x = from_int(5);
        b.velocity.x = from_int(-5);
        assert_eq!(compute_push(&a, &b, ground()), None);

        // One grounded is not enough either
        b.position.y = from_int(GROUND_Y);
        assert_eq!(compute_push(&a, &b, ground()), None);
    }

    #[test]
    fn test_push_within_ground_tolerance() {
        let a = fighter_at(PlayerSlot::Player1, 400, GROUND_Y - 10);
        let b = fighter_at(PlayerSlot::Player2, 420, GROUND_Y);
        assert!(compute_push(&a, &b, ground()).is_some());

        let c = fighter_at(PlayerSlot::Player1, 400, GROUND_Y - 11);
        assert_eq!(compute_push(&c, &b, ground()), None);
    }
}
