//! # Program Structure
//!
//! A program is the ordered instruction sequence produced by the generator
//! for one `(height, variant)` pair, terminated by a single `Halt`. Programs
//! are immutable once built: backends only read them.

use crate::error::SpecError;
use crate::{
    Instruction, Opcode, Register, Variant, NUM_INSTRUCTIONS_MAX, NUM_INSTRUCTIONS_MIN,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A finished randomized-math program.
///
/// Length invariant: `NUM_INSTRUCTIONS_MIN <= len() <= NUM_INSTRUCTIONS_MAX`,
/// where `len()` excludes the trailing Halt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Create an empty program with capacity for the maximum length plus
    /// the Halt terminator.
    pub fn with_max_capacity() -> Self {
        Self {
            instructions: Vec::with_capacity(NUM_INSTRUCTIONS_MAX + 1),
        }
    }

    /// Build a program from a finished instruction sequence.
    ///
    /// The sequence must already be Halt-terminated; invariants are checked
    /// by [`Program::validate`], not here.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Append one instruction. Generation-time only.
    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    /// Number of instructions, excluding the Halt terminator.
    pub fn len(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| !i.is_halt())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full instruction sequence including the terminator.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Whether any instruction reads `reg` as its source.
    pub fn reads_source(&self, reg: Register) -> bool {
        self.instructions
            .iter()
            .any(|i| !i.is_halt() && i.src == reg)
    }

    /// Validate the program against all structural invariants.
    ///
    /// Checks the length bounds, Halt placement, destination writability,
    /// self-operand prohibition, immediate usage, and (for variants that
    /// require it) that r8 appears as a source.
    pub fn validate(&self, variant: Variant) -> Result<(), SpecError> {
        let body_len = self.len();
        if !(NUM_INSTRUCTIONS_MIN..=NUM_INSTRUCTIONS_MAX).contains(&body_len) {
            return Err(SpecError::ProgramLength {
                found: body_len,
                min: NUM_INSTRUCTIONS_MIN,
                max: NUM_INSTRUCTIONS_MAX,
            });
        }

        // Exactly one Halt, and it must be last
        match self.instructions.last() {
            Some(last) if last.is_halt() => {}
            _ => return Err(SpecError::MissingHalt),
        }
        if self.instructions.len() != body_len + 1 {
            return Err(SpecError::MissingHalt);
        }

        for (index, inst) in self.instructions[..body_len].iter().enumerate() {
            if !inst.dst.is_variable() {
                return Err(SpecError::ConstantDestination {
                    index,
                    register: inst.dst.index(),
                });
            }
            if inst.opcode.forbids_self_operand() && inst.dst == inst.src {
                return Err(SpecError::SelfOperand {
                    index,
                    opcode: inst.opcode.to_string(),
                });
            }
            if !inst.opcode.uses_immediate() && inst.imm != 0 {
                return Err(SpecError::StrayImmediate {
                    index,
                    opcode: inst.opcode.to_string(),
                });
            }
        }

        if variant.requires_r8_usage() && !self.reads_source(Register::R8) {
            return Err(SpecError::UnusedConstantRegister);
        }

        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, inst) in self.instructions.iter().enumerate() {
            writeln!(f, "{:3}: {}", i, inst)?;
        }
        Ok(())
    }
}
