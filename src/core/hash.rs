//! State Hashing for Verification
//!
//! Deterministic hashing of match state, used to check that a replayed
//! match reproduces the live one exactly.

use sha2::{Sha256, Digest};
use super::fixed::Fixed;
use super::vec2::FixedVec2;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for fixed-point types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"FIGHT_NIGHT_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an optional deadline. `None` hashes differently from any `Some`.
    #[inline]
    pub fn update_deadline(&mut self, value: Option<u64>) {
        match value {
            Some(at) => {
                self.update_u8(1);
                self.update_u64(at);
            }
            None => self.update_u8(0),
        }
    }

    /// Update with a Fixed value.
    #[inline]
    pub fn update_fixed(&mut self, value: Fixed) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a FixedVec2.
    #[inline]
    pub fn update_vec2(&mut self, value: FixedVec2) {
        self.update_fixed(value.x);
        self.update_fixed(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for match verification.
///
/// This function is called by `MatchState::compute_hash()`.
/// The closure adds the state-specific data.
pub fn compute_state_hash<F>(tick: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_match_state();

    // Always hash the tick first
    hasher.update_u32(tick);

    add_state(&mut hasher);

    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_match_state();
            hasher.update_u32(100);
            hasher.update_fixed(to_fixed(5.5));
            hasher.update_vec2(FixedVec2::new(to_fixed(1.0), to_fixed(2.0)));
            hasher.update_bool(true);
            hasher.update_deadline(Some(500));
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_deadline_none_differs_from_zero() {
        let none = {
            let mut h = StateHasher::new(b"test");
            h.update_deadline(None);
            h.finalize()
        };
        let zero = {
            let mut h = StateHasher::new(b"test");
            h.update_deadline(Some(0));
            h.finalize()
        };
        assert_ne!(none, zero);
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(100, |hasher| {
            hasher.update_fixed(to_fixed(5.0));
        });
        let hash2 = compute_state_hash(100, |hasher| {
            hasher.update_fixed(to_fixed(5.0));
        });
        assert_eq!(hash, hash2);

        let hash3 = compute_state_hash(101, |hasher| {
            hasher.update_fixed(to_fixed(5.0));
        });
        assert_ne!(hash, hash3);
    }
}
