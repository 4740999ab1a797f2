//! x86-64 instruction encoding.
//!
//! Emits a single leaf function with the System V calling convention:
//! `extern "C" fn(*mut W)` where the argument (in `rdi`) points at the
//! nine-lane register file. Every logical register is pinned to a physical
//! register for the whole function, so instruction bodies are pure
//! register-to-register arithmetic:
//!
//! | logical | r0 | r1 | r2  | r3  | r4  | r5  | r6  | r7  | r8  |
//! | physical| r8 | r9 | r10 | r11 | rbx | r12 | r13 | r14 | r15 |
//!
//! `rcx` is the only scratch register: immediates are staged there, and
//! variable rotate counts must live in `cl`. The callee-saved registers
//! `rbx` and `r12`-`r15` are preserved around the body. Narrow (32-bit)
//! lanes use the same scheme without the REX.W prefix; 32-bit operations
//! zero-extend, so the upper halves stay clean between instructions.

use randmath_spec::{Opcode, Program, NUM_REGISTERS, VARIABLE_REGISTERS};

use super::buffer::ExecutableBuffer;
use crate::error::Result;
use crate::word::Word;

/// Physical register number for each logical register.
const PHYS: [u8; NUM_REGISTERS] = [8, 9, 10, 11, 3, 12, 13, 14, 15];

/// Scratch register (`rcx`); holds immediates and rotate counts.
const SCRATCH: u8 = 1;

/// `rdi`: pointer to the register file.
const REG_FILE: u8 = 7;

/// How the ModRM reg field of a template is patched.
#[derive(Clone, Copy)]
enum RegField {
    /// reg = destination, rm = source (RM-form instructions).
    Dst,
    /// reg = source, rm = destination (MR-form instructions).
    Src,
    /// reg = fixed opcode extension, rm = destination.
    Ext(u8),
}

/// Encoding template for one arithmetic opcode. The emitter is a single
/// loop over these; adding an opcode (or porting to another architecture)
/// means adding a table row, not new control flow.
struct OpTemplate {
    /// Primary opcode bytes, before the ModRM byte.
    opcode: &'static [u8],
    reg_field: RegField,
    /// Copy the source register into the scratch register first (variable
    /// rotate counts must be in `cl`).
    stage_count: bool,
    /// Follow with `mov ecx, imm32; add dst, rcx`. Staging through `ecx`
    /// keeps the immediate zero-extended on wide lanes, which a direct
    /// `add r64, imm32` (sign-extending) would not.
    add_immediate: bool,
}

/// Indexed by [`Opcode::to_u8`]; `halt` has no row.
const TEMPLATES: [OpTemplate; 6] = [
    // mul: imul dst, src
    OpTemplate {
        opcode: &[0x0F, 0xAF],
        reg_field: RegField::Dst,
        stage_count: false,
        add_immediate: false,
    },
    // add: add dst, src + immediate tail
    OpTemplate {
        opcode: &[0x01],
        reg_field: RegField::Src,
        stage_count: false,
        add_immediate: true,
    },
    // sub: sub dst, src
    OpTemplate {
        opcode: &[0x29],
        reg_field: RegField::Src,
        stage_count: false,
        add_immediate: false,
    },
    // ror: mov rcx, src; ror dst, cl
    OpTemplate {
        opcode: &[0xD3],
        reg_field: RegField::Ext(1),
        stage_count: true,
        add_immediate: false,
    },
    // rol: mov rcx, src; rol dst, cl
    OpTemplate {
        opcode: &[0xD3],
        reg_field: RegField::Ext(0),
        stage_count: true,
        add_immediate: false,
    },
    // xor: xor dst, src
    OpTemplate {
        opcode: &[0x31],
        reg_field: RegField::Src,
        stage_count: false,
        add_immediate: false,
    },
];

/// Emits the complete function body for `program` into `buf`.
pub(super) fn emit_program<W: Word>(program: &Program, buf: &mut ExecutableBuffer) -> Result<()> {
    let wide = W::BITS == 64;
    let lane = (W::BITS / 8) as u8;

    emit_prologue(buf)?;
    for (i, &phys) in PHYS.iter().enumerate() {
        emit_load(buf, phys, i as u8 * lane, wide)?;
    }

    for inst in program.instructions() {
        if inst.opcode == Opcode::Halt {
            break;
        }
        let dst = PHYS[inst.dst.index()];
        let src = PHYS[inst.src.index()];
        let template = &TEMPLATES[inst.opcode.to_u8() as usize];

        if template.stage_count {
            emit_rr(buf, &[0x89], src, SCRATCH, wide)?; // mov rcx, src
        }
        let (reg, rm) = match template.reg_field {
            RegField::Dst => (dst, src),
            RegField::Src => (src, dst),
            RegField::Ext(ext) => (ext, dst),
        };
        emit_rr(buf, template.opcode, reg, rm, wide)?;
        if template.add_immediate {
            buf.write(&[0xB9])?; // mov ecx, imm32
            buf.write(&inst.imm.to_le_bytes())?;
            emit_rr(buf, &[0x01], SCRATCH, dst, wide)?; // add dst, rcx
        }
    }

    for (i, &phys) in PHYS.iter().enumerate().take(VARIABLE_REGISTERS) {
        emit_store(buf, phys, i as u8 * lane, wide)?;
    }
    emit_epilogue(buf)
}

fn emit_prologue(buf: &mut ExecutableBuffer) -> Result<()> {
    buf.write(&[0x53])?; // push rbx
    buf.write(&[0x41, 0x54])?; // push r12
    buf.write(&[0x41, 0x55])?; // push r13
    buf.write(&[0x41, 0x56])?; // push r14
    buf.write(&[0x41, 0x57]) // push r15
}

fn emit_epilogue(buf: &mut ExecutableBuffer) -> Result<()> {
    buf.write(&[0x41, 0x5F])?; // pop r15
    buf.write(&[0x41, 0x5E])?; // pop r14
    buf.write(&[0x41, 0x5D])?; // pop r13
    buf.write(&[0x41, 0x5C])?; // pop r12
    buf.write(&[0x5B])?; // pop rbx
    buf.write(&[0xC3]) // ret
}

/// `mov reg, [rdi + disp]`, lane-sized. A 32-bit load zero-extends.
fn emit_load(buf: &mut ExecutableBuffer, reg: u8, disp: u8, wide: bool) -> Result<()> {
    emit_rex(buf, wide, reg, REG_FILE)?;
    buf.write(&[0x8B, modrm_disp8(reg, REG_FILE), disp])
}

/// `mov [rdi + disp], reg`, lane-sized.
fn emit_store(buf: &mut ExecutableBuffer, reg: u8, disp: u8, wide: bool) -> Result<()> {
    emit_rex(buf, wide, reg, REG_FILE)?;
    buf.write(&[0x89, modrm_disp8(reg, REG_FILE), disp])
}

/// Register-to-register operation with direct addressing. `reg` is the
/// ModRM reg field (a register number or an opcode extension), `rm` the
/// destination register.
fn emit_rr(buf: &mut ExecutableBuffer, opcode: &[u8], reg: u8, rm: u8, wide: bool) -> Result<()> {
    emit_rex(buf, wide, reg, rm)?;
    buf.write(opcode)?;
    buf.write(&[0xC0 | ((reg & 7) << 3) | (rm & 7)])
}

/// REX prefix for the given operand size and register extensions. Omitted
/// entirely when no bit is set.
fn emit_rex(buf: &mut ExecutableBuffer, wide: bool, reg: u8, rm: u8) -> Result<()> {
    let rex = 0x40 | (u8::from(wide) << 3) | (((reg >> 3) & 1) << 2) | ((rm >> 3) & 1);
    if rex != 0x40 {
        buf.write(&[rex])?;
    }
    Ok(())
}

/// ModRM byte for `[rdi + disp8]` addressing.
fn modrm_disp8(reg: u8, rm: u8) -> u8 {
    0x40 | ((reg & 7) << 3) | (rm & 7)
}
