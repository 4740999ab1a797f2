//! Native code backend.
//!
//! Compiles a program once into position-independent x86-64 machine code
//! and executes it directly. The generated function takes a pointer to the
//! nine-lane register file and mutates the variable lanes in place, exactly
//! like the interpreter.
//!
//! On targets other than x86-64 unix, [`CompiledProgram::compile`] fails
//! with [`RuntimeError::UnsupportedPlatform`] and callers are expected to
//! fall back to the interpreter.

mod buffer;
mod emit;

use std::marker::PhantomData;

use randmath_spec::{Program, NUM_REGISTERS};

use crate::error::{Result, RuntimeError};
use crate::word::Word;

pub use buffer::ExecutableBuffer;

/// Code buffer capacity: generous for the worst-case program (70
/// instructions at no more than 11 bytes each, plus prologue and epilogue),
/// and one page-rounding away from a single 4 KiB page.
const CODE_CAPACITY: usize = 8192;

/// A program compiled to native code for one lane width.
///
/// The backing memory is read+execute for the lifetime of the value and is
/// unmapped on drop.
pub struct CompiledProgram<W: Word> {
    code: ExecutableBuffer,
    _lane: PhantomData<W>,
}

impl<W: Word> CompiledProgram<W> {
    /// Compiles `program` to machine code and seals the buffer.
    ///
    /// The program must end with a `halt` terminator; everything after the
    /// first `halt` is ignored, matching the interpreter.
    pub fn compile(program: &Program) -> Result<Self> {
        if !cfg!(all(target_arch = "x86_64", unix)) {
            return Err(RuntimeError::UnsupportedPlatform);
        }
        if !program.instructions().last().is_some_and(|i| i.is_halt()) {
            return Err(randmath_spec::SpecError::MissingHalt.into());
        }

        let mut code = ExecutableBuffer::new(CODE_CAPACITY)?;
        emit::emit_program::<W>(program, &mut code)?;
        code.freeze()?;
        tracing::debug!(
            code_bytes = code.len(),
            lane_bits = W::BITS,
            "compiled program to native code"
        );

        Ok(Self {
            code,
            _lane: PhantomData,
        })
    }

    /// Runs the compiled code against the given register file.
    pub fn invoke(&self, registers: &mut [W; NUM_REGISTERS]) {
        debug_assert!(self.code.is_executable());
        // SAFETY: `compile` emitted a complete function with a `ret` and
        // froze the buffer read+execute. The code follows the System V
        // ABI with a single pointer argument and only touches the
        // NUM_REGISTERS lanes behind it.
        let entry: extern "C" fn(*mut W) = unsafe { std::mem::transmute(self.code.as_ptr()) };
        entry(registers.as_mut_ptr());
    }

    /// Size of the generated code in bytes.
    pub fn code_len(&self) -> usize {
        self.code.len()
    }
}
