//! Register definitions for the randomized-math register file

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of registers
pub const NUM_REGISTERS: usize = 9;

/// Number of mutable "variable" registers (R0-R3). Destination indices are
/// 2 bits wide in the random encoding, which is why only these four can be
/// written.
pub const VARIABLE_REGISTERS: usize = 4;

/// Register (r0-r8)
///
/// R0-R3 are variable registers seeded from the live hash state; R4-R8 are
/// constant registers preloaded from loop-invariant material and never
/// written by a generated program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    R8 = 8,
}

impl Register {
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::R0),
            1 => Some(Self::R1),
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            7 => Some(Self::R7),
            8 => Some(Self::R8),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Variable registers are the only valid instruction destinations.
    #[inline]
    pub fn is_variable(self) -> bool {
        (self as usize) < VARIABLE_REGISTERS
    }

    /// Constant registers may only appear as sources.
    #[inline]
    pub fn is_constant(self) -> bool {
        !self.is_variable()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::R0 => "r0",
            Self::R1 => "r1",
            Self::R2 => "r2",
            Self::R3 => "r3",
            Self::R4 => "r4",
            Self::R5 => "r5",
            Self::R6 => "r6",
            Self::R7 => "r7",
            Self::R8 => "r8",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_roundtrip() {
        for i in 0..NUM_REGISTERS {
            let reg = Register::from_index(i).unwrap();
            assert_eq!(reg.index(), i);
        }
        assert_eq!(Register::from_index(9), None);
        assert_eq!(Register::from_index(usize::MAX), None);
    }

    #[test]
    fn test_variable_constant_split() {
        for i in 0..VARIABLE_REGISTERS {
            let reg = Register::from_index(i).unwrap();
            assert!(reg.is_variable());
            assert!(!reg.is_constant());
        }
        for i in VARIABLE_REGISTERS..NUM_REGISTERS {
            let reg = Register::from_index(i).unwrap();
            assert!(reg.is_constant());
            assert!(!reg.is_variable());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Register::R0.to_string(), "r0");
        assert_eq!(Register::R8.to_string(), "r8");
    }
}
