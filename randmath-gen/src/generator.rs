//! Two-phase constrained program generation
//!
//! Phase A draws candidate instructions from the byte stream and accepts
//! them against the pipeline model until every variable register reaches
//! the real-CPU latency target (or the retry budgets run out). Phase B then
//! appends a fixed filler pattern until the ASIC latency model also reaches
//! the target, so the program stays expensive even for fully parallel
//! hardware. An acceptance gate re-runs the whole process until the
//! finished program satisfies the length and register-usage invariants.
//!
//! Every random byte sequence decodes to a valid candidate; rejection and
//! retry are the error-handling mechanism here, not results.

use crate::scheduler::{Scheduler, SlotSearch};
use crate::stream::{ByteStream, Sha256Refresh, StreamHash};
use randmath_spec::{
    Instruction, Opcode, Program, Register, Variant, NUM_INSTRUCTIONS_MAX, NUM_INSTRUCTIONS_MIN,
    TOTAL_LATENCY,
};
use tracing::debug;

/// Phase A stops after this many consecutive rejections.
const SOFT_RETRY_LIMIT: usize = 64;

/// Absolute ceiling on phase A iterations, guaranteeing termination.
const HARD_ITERATION_LIMIT: usize = 256;

/// Candidate field widths in the random encoding.
const OPCODE_BITS: u32 = 3;
const DST_INDEX_BITS: u32 = 2;

/// Filler opcodes appended cyclically by phase B.
const ASIC_FILL_PATTERN: [Opcode; 3] = [Opcode::Ror, Opcode::Mul, Opcode::Mul];

/// Generate the program for `(height, variant)` using the default SHA-256
/// stream refresh.
pub fn generate(height: u64, variant: Variant) -> Program {
    generate_with_hash(height, variant, &Sha256Refresh)
}

/// Generate with a caller-injected stream refresh function.
///
/// Deterministic: identical inputs always produce identical programs. The
/// outer acceptance loop is unbounded by design; convergence is
/// probabilistic (measured retry rate below 2%) and the byte stream state
/// carries over between attempts, so no attempt repeats its predecessor.
pub fn generate_with_hash<H: StreamHash>(height: u64, variant: Variant, hasher: &H) -> Program {
    let mut stream = ByteStream::new(height, variant, hasher);
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        let (code, r8_used, retries) = generate_attempt(&mut stream, variant);

        let accepted = r8_used
            && (NUM_INSTRUCTIONS_MIN..=NUM_INSTRUCTIONS_MAX).contains(&code.len());
        debug!(
            height,
            ?variant,
            attempt,
            len = code.len(),
            retries,
            accepted,
            "generation attempt finished"
        );

        if accepted {
            let mut program = Program::from_instructions(code);
            program.push(Instruction::halt());
            return program;
        }
    }
}

/// One full phase A + phase B pass. Returns the (unterminated) instruction
/// sequence, whether r8 was read, and the phase A rejection count.
fn generate_attempt<H: StreamHash>(
    stream: &mut ByteStream<'_, H>,
    variant: Variant,
) -> (Vec<Instruction>, bool, usize) {
    let mut sched = Scheduler::new();
    let mut code: Vec<Instruction> = Vec::with_capacity(NUM_INSTRUCTIONS_MAX + 1);
    let mut r8_used = !variant.requires_r8_usage();
    let mut num_retries = 0usize;
    let mut total_iterations = 0usize;

    // Phase A: constrained random scheduling against the real-CPU model
    while sched.any_variable_below_target() && num_retries < SOFT_RETRY_LIMIT {
        total_iterations += 1;
        if total_iterations > HARD_ITERATION_LIMIT {
            break;
        }

        let c = stream.next_byte();
        let opcode = decode_opcode(c, stream);
        let dst_index = ((c >> OPCODE_BITS) & ((1u8 << DST_INDEX_BITS) - 1)) as usize;
        let mut src_index = ((c >> (OPCODE_BITS + DST_INDEX_BITS)) & 0x07) as usize;

        // add/sub/xor with itself collapses; remap the source to a
        // disjoint register instead of dropping the candidate
        if opcode.forbids_self_operand() && dst_index == src_index {
            src_index = match variant {
                Variant::Baseline => dst_index + 4,
                Variant::Salted => 8,
            };
        }

        // Rotating a register that already holds an unretired rotation is
        // equivalent to a single rotation
        if opcode.is_rotation() && sched.rotation_pending(dst_index) {
            continue;
        }

        if sched.is_redundant(opcode, dst_index, src_index) {
            continue;
        }

        let slot = sched.find_slot(opcode, dst_index, src_index);

        // Never leave a register unchanged for too many cycles
        if sched.too_stale(dst_index, slot.issue_cycle()) {
            continue;
        }

        match slot {
            SlotSearch::Found { cycle, alu } if cycle + opcode.latency() <= TOTAL_LATENCY => {
                sched.commit(opcode, dst_index, src_index, cycle, alu, code.len());
                if src_index == Register::R8.index() {
                    r8_used = true;
                }

                // Additions fold in a 32-bit constant drawn from the stream
                let imm = if opcode == Opcode::Add {
                    stream.next_u32_le()
                } else {
                    0
                };
                code.push(Instruction {
                    opcode,
                    dst: register(dst_index),
                    src: register(src_index),
                    imm,
                });

                if code.len() >= NUM_INSTRUCTIONS_MIN {
                    break;
                }
            }
            _ => num_retries += 1,
        }
    }

    // Phase B: top up the ASIC latency model with a fixed filler pattern,
    // destination = register with the lowest ASIC latency, source = highest
    let prev_len = code.len();
    while code.len() < NUM_INSTRUCTIONS_MAX && sched.all_variables_below_asic_target() {
        let (min_idx, max_idx) = sched.asic_latency_extremes();
        let opcode = ASIC_FILL_PATTERN[(code.len() - prev_len) % ASIC_FILL_PATTERN.len()];
        sched.commit_asic_fill(opcode, min_idx, max_idx);
        code.push(Instruction::new(opcode, register(min_idx), register(max_idx)));
    }

    (code, r8_used, num_retries)
}

/// Decode the 3-bit opcode field. Three codes collapse onto multiply, code
/// 5 draws one more byte whose sign selects the rotation direction, and the
/// two top codes map to xor.
fn decode_opcode<H: StreamHash>(c: u8, stream: &mut ByteStream<'_, H>) -> Opcode {
    match c & ((1u8 << OPCODE_BITS) - 1) {
        0..=2 => Opcode::Mul,
        3 => Opcode::Add,
        4 => Opcode::Sub,
        5 => {
            if (stream.next_byte() as i8) >= 0 {
                Opcode::Ror
            } else {
                Opcode::Rol
            }
        }
        _ => Opcode::Xor,
    }
}

/// Indices come from 2/3-bit fields and the fixed remap table, so they are
/// always in range.
fn register(index: usize) -> Register {
    Register::from_index(index).expect("register field is at most 3 bits")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_satisfies_invariants() {
        for height in [0u64, 1, 2, 63, 1_000_000] {
            for variant in [Variant::Baseline, Variant::Salted] {
                let program = generate(height, variant);
                program
                    .validate(variant)
                    .unwrap_or_else(|e| panic!("h={} {:?}: {}", height, variant, e));
            }
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(12_345, Variant::Salted);
        let b = generate(12_345, Variant::Salted);
        assert_eq!(a, b);
    }

    #[test]
    fn test_variants_diverge() {
        let baseline = generate(77, Variant::Baseline);
        let salted = generate(77, Variant::Salted);
        assert_ne!(baseline, salted);
    }

    #[test]
    fn test_heights_diverge() {
        assert_ne!(
            generate(500, Variant::Baseline),
            generate(501, Variant::Baseline)
        );
    }

    #[test]
    fn test_length_bounds() {
        for height in 0..32u64 {
            let program = generate(height, Variant::Salted);
            let len = program.len();
            assert!(
                (NUM_INSTRUCTIONS_MIN..=NUM_INSTRUCTIONS_MAX).contains(&len),
                "height {} produced length {}",
                height,
                len
            );
        }
    }

    #[test]
    fn test_salted_always_reads_r8() {
        for height in 0..32u64 {
            let program = generate(height, Variant::Salted);
            assert!(program.reads_source(Register::R8), "height {}", height);
        }
    }

    #[test]
    fn test_no_self_operands() {
        for height in 0..16u64 {
            for variant in [Variant::Baseline, Variant::Salted] {
                let program = generate(height, variant);
                for inst in program.instructions() {
                    if inst.opcode.forbids_self_operand() {
                        assert_ne!(inst.dst, inst.src, "{}", inst);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rotation_non_repetition() {
        // No two rotations of the same destination without an intervening
        // non-rotation write to it (phase B fillers follow the same rule
        // because its pattern never rotates twice in a row)
        for height in 0..16u64 {
            let program = generate(height, Variant::Salted);
            let mut pending = [false; 4];
            for inst in program.instructions() {
                if inst.is_halt() {
                    break;
                }
                let d = inst.dst.index();
                if inst.opcode.is_rotation() {
                    assert!(!pending[d], "height {}: repeated rotation on r{}", height, d);
                }
                pending[d] = inst.opcode.is_rotation();
            }
        }
    }

    #[test]
    fn test_terminated_by_single_halt() {
        let program = generate(9, Variant::Baseline);
        let insts = program.instructions();
        assert!(insts.last().map(Instruction::is_halt).unwrap_or(false));
        assert_eq!(insts.iter().filter(|i| i.is_halt()).count(), 1);
    }

    #[test]
    fn test_immediates_only_on_add() {
        let program = generate(4, Variant::Salted);
        for inst in program.instructions() {
            if !inst.opcode.uses_immediate() {
                assert_eq!(inst.imm, 0);
            }
        }
    }
}
