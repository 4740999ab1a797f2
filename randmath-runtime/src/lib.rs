//! # Randmath Runtime
//!
//! Execution backends for generated arithmetic programs.
//!
//! Two backends with identical observable behavior:
//!
//! - **Interpreter** ([`run`]): portable, executes instructions one at a
//!   time. Works on every target and every lane width.
//! - **Native code** ([`CompiledProgram`]): compiles the program once into
//!   x86-64 machine code in an mmap'd region and calls it directly. On
//!   other targets compilation fails with a typed error so callers can fall
//!   back to the interpreter.
//!
//! Both are generic over the register lane width through [`Word`], which
//! is implemented for `u32` and `u64`.
//!
//! ## Example
//!
//! ```rust
//! use randmath_gen::generate;
//! use randmath_spec::{Variant, NUM_REGISTERS};
//!
//! let program = generate(1, Variant::Baseline);
//! let mut registers = [0u64; NUM_REGISTERS];
//! registers[4..].copy_from_slice(&[10, 20, 30, 40, 50]);
//! randmath_runtime::run(&program, &mut registers);
//! ```

pub mod error;
pub mod interp;
pub mod jit;
pub mod word;

pub use error::{Result, RuntimeError};
pub use interp::run;
pub use jit::{CompiledProgram, ExecutableBuffer};
pub use word::Word;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let _ = RuntimeError::UnsupportedPlatform;
        let _: fn(&randmath_spec::Program, &mut [u64; 9]) = run::<u64>;
    }
}
