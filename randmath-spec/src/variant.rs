//! Protocol variants
//!
//! Two deployed forks of the randomized-math rules differ in three places:
//! how the seed buffer is perturbed, which register a self-operand collision
//! is remapped to, and whether the register-8 acceptance gate applies.

use serde::{Deserialize, Serialize};

/// Seed byte overwritten by the salted variant.
pub const SALT_BYTE_INDEX: usize = 20;

/// Value written over the salt byte (-38 as a signed byte).
pub const SALT_BYTE_VALUE: u8 = 0xDA;

/// Randomized-math protocol variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// No seed perturbation. Self-operand collisions remap the source to
    /// `dst + 4` (the constant register paired with the destination), and
    /// the register-8 usage gate is pre-satisfied.
    Baseline,

    /// Seed byte [`SALT_BYTE_INDEX`] is overwritten with
    /// [`SALT_BYTE_VALUE`] before the stream is first used. Self-operand
    /// collisions remap the source to r8, and every accepted program must
    /// read r8 at least once.
    Salted,
}

impl Variant {
    /// Whether the acceptance gate requiring r8 as a source applies.
    #[inline]
    pub fn requires_r8_usage(self) -> bool {
        matches!(self, Variant::Salted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r8_gate() {
        assert!(!Variant::Baseline.requires_r8_usage());
        assert!(Variant::Salted.requires_r8_usage());
    }

    #[test]
    fn test_salt_value_is_minus_38() {
        assert_eq!(SALT_BYTE_VALUE as i8, -38);
    }
}
