//! # Opcode Definitions
//!
//! Seven opcodes: six ALU operations plus the `Halt` sentinel that
//! terminates every program. Each ALU opcode carries two latency figures
//! (real CPU and idealized ASIC) and an ALU-width requirement; these drive
//! the generator's scheduling model and are behavioral constants of the
//! protocol, not tunables.

use crate::{ALU_COUNT, ALU_COUNT_MUL};
use serde::{Deserialize, Serialize};

/// Instruction opcode
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// MUL: dst = dst * src
    Mul = 0,
    /// ADD: dst = dst + src + C, C is a 32-bit constant
    Add = 1,
    /// SUB: dst = dst - src
    Sub = 2,
    /// ROR: rotate dst right by src (mod register width) bits
    Ror = 3,
    /// ROL: rotate dst left by src (mod register width) bits
    Rol = 4,
    /// XOR: dst = dst ^ src
    Xor = 5,
    /// HALT: stop execution (terminator, never scheduled)
    Halt = 6,
}

/// Number of schedulable opcodes (Halt excluded).
pub const ALU_OPCODE_COUNT: usize = 6;

/// Real-CPU latency per opcode, indexed by `Opcode as usize`.
///
/// mul is 3 cycles, 3-way addition and rotations are 2 cycles, sub/xor are
/// 1 cycle. These match instruction latencies on Intel CPUs from Sandy
/// Bridge through Coffee Lake (source: Agner Fog's instruction tables).
const OP_LATENCY: [usize; ALU_OPCODE_COUNT] = [3, 2, 1, 2, 2, 1];

/// Latency per opcode for a theoretical ASIC implementation, where
/// everything except multiplication is a single cycle.
const ASIC_OP_LATENCY: [usize; ALU_OPCODE_COUNT] = [3, 1, 1, 1, 1, 1];

/// ALUs able to execute each opcode.
const OP_ALUS: [usize; ALU_OPCODE_COUNT] = [
    ALU_COUNT_MUL,
    ALU_COUNT,
    ALU_COUNT,
    ALU_COUNT,
    ALU_COUNT,
    ALU_COUNT,
];

impl Opcode {
    /// Try to convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Opcode::Mul),
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Sub),
            3 => Some(Opcode::Ror),
            4 => Some(Opcode::Rol),
            5 => Some(Opcode::Xor),
            6 => Some(Opcode::Halt),
            _ => None,
        }
    }

    /// Convert to u8
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Issue-to-retire latency on the modeled real CPU.
    ///
    /// Halt is never scheduled; asking for its latency is a logic error
    /// and panics.
    #[inline]
    pub fn latency(self) -> usize {
        debug_assert!(self != Opcode::Halt, "halt is never scheduled");
        OP_LATENCY[self as usize]
    }

    /// Latency on the idealized fully-parallel ASIC model. Panics for
    /// `Halt`, which is never scheduled.
    #[inline]
    pub fn asic_latency(self) -> usize {
        debug_assert!(self != Opcode::Halt, "halt is never scheduled");
        ASIC_OP_LATENCY[self as usize]
    }

    /// How many of the modeled ALUs can execute this opcode. Panics for
    /// `Halt`, which is never scheduled.
    #[inline]
    pub fn alu_count(self) -> usize {
        debug_assert!(self != Opcode::Halt, "halt is never scheduled");
        OP_ALUS[self as usize]
    }

    /// Check if this is a rotation opcode
    #[inline]
    pub const fn is_rotation(self) -> bool {
        matches!(self, Opcode::Ror | Opcode::Rol)
    }

    /// Check if this opcode forbids `src == dst`.
    ///
    /// `x + x + C`, `x - x` and `x ^ x` collapse to cheaper forms, so the
    /// generator remaps the source register instead of scheduling them.
    #[inline]
    pub const fn forbids_self_operand(self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub | Opcode::Xor)
    }

    /// Check if this opcode carries a 32-bit immediate constant
    #[inline]
    pub const fn uses_immediate(self) -> bool {
        matches!(self, Opcode::Add)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Opcode::Mul => "mul",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Ror => "ror",
            Opcode::Rol => "rol",
            Opcode::Xor => "xor",
            Opcode::Halt => "halt",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_values() {
        assert_eq!(Opcode::Mul.to_u8(), 0);
        assert_eq!(Opcode::Add.to_u8(), 1);
        assert_eq!(Opcode::Sub.to_u8(), 2);
        assert_eq!(Opcode::Ror.to_u8(), 3);
        assert_eq!(Opcode::Rol.to_u8(), 4);
        assert_eq!(Opcode::Xor.to_u8(), 5);
        assert_eq!(Opcode::Halt.to_u8(), 6);
    }

    #[test]
    fn test_opcode_from_u8() {
        for v in 0..=6u8 {
            let op = Opcode::from_u8(v).unwrap();
            assert_eq!(op.to_u8(), v);
        }
        assert_eq!(Opcode::from_u8(7), None);
        assert_eq!(Opcode::from_u8(0xFF), None);
    }

    #[test]
    fn test_latency_tables() {
        assert_eq!(Opcode::Mul.latency(), 3);
        assert_eq!(Opcode::Add.latency(), 2);
        assert_eq!(Opcode::Sub.latency(), 1);
        assert_eq!(Opcode::Ror.latency(), 2);
        assert_eq!(Opcode::Rol.latency(), 2);
        assert_eq!(Opcode::Xor.latency(), 1);

        // The ASIC only pays full price for multiplication
        assert_eq!(Opcode::Mul.asic_latency(), 3);
        for op in [Opcode::Add, Opcode::Sub, Opcode::Ror, Opcode::Rol, Opcode::Xor] {
            assert_eq!(op.asic_latency(), 1);
        }
    }

    #[test]
    #[should_panic]
    fn test_halt_has_no_latency() {
        let _ = Opcode::Halt.latency();
    }

    #[test]
    fn test_alu_widths() {
        assert_eq!(Opcode::Mul.alu_count(), ALU_COUNT_MUL);
        assert_eq!(Opcode::Add.alu_count(), ALU_COUNT);
        assert_eq!(Opcode::Xor.alu_count(), ALU_COUNT);
    }

    #[test]
    fn test_rotation_predicate() {
        assert!(Opcode::Ror.is_rotation());
        assert!(Opcode::Rol.is_rotation());
        assert!(!Opcode::Mul.is_rotation());
        assert!(!Opcode::Halt.is_rotation());
    }

    #[test]
    fn test_self_operand_predicate() {
        assert!(Opcode::Add.forbids_self_operand());
        assert!(Opcode::Sub.forbids_self_operand());
        assert!(Opcode::Xor.forbids_self_operand());
        assert!(!Opcode::Mul.forbids_self_operand());
        assert!(!Opcode::Ror.forbids_self_operand());
        assert!(!Opcode::Rol.forbids_self_operand());
    }

    #[test]
    fn test_uses_immediate() {
        assert!(Opcode::Add.uses_immediate());
        assert!(!Opcode::Mul.uses_immediate());
        assert!(!Opcode::Halt.uses_immediate());
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::Mul.to_string(), "mul");
        assert_eq!(Opcode::Halt.to_string(), "halt");
    }
}
