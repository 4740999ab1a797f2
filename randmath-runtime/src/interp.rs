//! Portable interpreter backend.
//!
//! Executes a program one instruction at a time against a nine-lane register
//! file. The dispatch loop is bounded by the maximum program length, so a
//! well-formed program always terminates within `len + 1` steps regardless
//! of its contents. In practice generated programs cluster at the short end
//! of the 60-70 range; lengths above 65 are rare.

use randmath_spec::{Instruction, Opcode, Program, NUM_INSTRUCTIONS_MAX, NUM_REGISTERS};

use crate::word::Word;

/// Executes `program` against the given register file.
///
/// Registers `r0`-`r3` are read and written; `r4`-`r8` are read-only inputs
/// and are left untouched by any well-formed program. Execution stops at the
/// first `halt` instruction or after the last slot, whichever comes first.
pub fn run<W: Word>(program: &Program, registers: &mut [W; NUM_REGISTERS]) {
    let instructions = program.instructions();
    for slot in 0..=NUM_INSTRUCTIONS_MAX {
        let Some(inst) = instructions.get(slot) else {
            return;
        };
        if step(inst, registers) {
            return;
        }
    }
}

/// Applies a single instruction. Returns `true` on `halt`.
fn step<W: Word>(inst: &Instruction, registers: &mut [W; NUM_REGISTERS]) -> bool {
    let src = registers[inst.src.index()];
    let dst = inst.dst.index();
    match inst.opcode {
        Opcode::Mul => registers[dst] = registers[dst].wrapping_mul(src),
        Opcode::Add => {
            registers[dst] = registers[dst]
                .wrapping_add(src)
                .wrapping_add(W::from_imm(inst.imm));
        }
        Opcode::Sub => registers[dst] = registers[dst].wrapping_sub(src),
        Opcode::Ror => registers[dst] = registers[dst].rotate_right(src.rotate_count()),
        Opcode::Rol => registers[dst] = registers[dst].rotate_left(src.rotate_count()),
        Opcode::Xor => registers[dst] = registers[dst] ^ src,
        Opcode::Halt => return true,
    }
    false
}
