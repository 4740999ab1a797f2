//! Instruction record
//!
//! One generated ALU operation: `dst = dst <op> src` with an optional
//! 32-bit constant folded into additions. Instructions are plain data;
//! execution order is the order they appear in a [`Program`](crate::Program).

use crate::{Opcode, Register};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single randomized-math instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub dst: Register,
    pub src: Register,
    /// 32-bit constant, meaningful only for [`Opcode::Add`]
    /// (`dst = dst + src + imm`). Zero for every other opcode.
    pub imm: u32,
}

impl Instruction {
    /// Construct a two-operand instruction with no immediate.
    pub fn new(opcode: Opcode, dst: Register, src: Register) -> Self {
        Self {
            opcode,
            dst,
            src,
            imm: 0,
        }
    }

    /// Construct an addition carrying its 32-bit constant.
    pub fn add(dst: Register, src: Register, imm: u32) -> Self {
        Self {
            opcode: Opcode::Add,
            dst,
            src,
            imm,
        }
    }

    /// The program terminator.
    pub fn halt() -> Self {
        Self {
            opcode: Opcode::Halt,
            dst: Register::R0,
            src: Register::R0,
            imm: 0,
        }
    }

    #[inline]
    pub fn is_halt(&self) -> bool {
        self.opcode == Opcode::Halt
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Halt => write!(f, "halt"),
            Opcode::Add => write!(
                f,
                "add {}, {}, {:#010x}",
                self.dst, self.src, self.imm
            ),
            op => write!(f, "{} {}, {}", op, self.dst, self.src),
        }
    }
}
