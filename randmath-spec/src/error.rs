//! Specification error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("Program length {found} outside [{min}, {max}]")]
    ProgramLength {
        found: usize,
        min: usize,
        max: usize,
    },

    #[error("Program is not terminated by a single final halt")]
    MissingHalt,

    #[error("Instruction {index} writes constant register {register}")]
    ConstantDestination { index: usize, register: usize },

    #[error("Instruction {index} ({opcode}) has dst == src")]
    SelfOperand { index: usize, opcode: String },

    #[error("Instruction {index} ({opcode}) carries a stray immediate")]
    StrayImmediate { index: usize, opcode: String },

    #[error("Register r8 never used as a source")]
    UnusedConstantRegister,
}

pub type Result<T> = std::result::Result<T, SpecError>;
