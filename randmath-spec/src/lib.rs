//! # Randomized-Arithmetic Specification
//!
//! Shared vocabulary for the randomized-math subsystem of the hash family:
//! the opcode set, the 9-register file, instruction and program types, and
//! the abstract timing model the generator schedules against.
//!
//! ## Register file
//! - 4 variable registers (R0-R3), seeded from live hash state and written
//!   back after execution
//! - 5 constant registers (R4-R8), preloaded from loop-invariant material
//!   and never written by a program
//!
//! ## Timing model
//! Two latency tables per opcode: one for a representative real CPU (3 ALUs,
//! 1 of which can multiply) and one for an idealized fully-parallel ASIC.
//! Generated programs must reach [`TOTAL_LATENCY`] under both models.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod register;
pub mod variant;

pub use error::SpecError;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::Program;
pub use register::{Register, NUM_REGISTERS, VARIABLE_REGISTERS};
pub use variant::{Variant, SALT_BYTE_INDEX, SALT_BYTE_VALUE};

/// Minimal theoretical program latency in abstract cycles.
///
/// Equivalent to 15 back-to-back multiplications at 3 cycles each.
pub const TOTAL_LATENCY: usize = 15 * 3;

/// Every generated program has at least this many instructions.
pub const NUM_INSTRUCTIONS_MIN: usize = 60;

/// Never generate more than this many instructions (the final Halt
/// terminator doesn't count here).
pub const NUM_INSTRUCTIONS_MAX: usize = 70;

/// Total ALUs modeled for the real CPU. Modern CPUs have 4, but the random
/// math executes together with the rest of the main loop, so only 3 are
/// assumed available.
pub const ALU_COUNT: usize = 3;

/// ALUs that can execute a multiply. Typically only 1 on modern CPUs.
pub const ALU_COUNT_MUL: usize = 1;
