//! Pipeline scheduling model
//!
//! Generation-time simulation of instruction issue on the abstract target
//! CPU: per-register readiness latencies, an ALU-occupancy grid, and a
//! compact per-register history used to reject redundant instruction pairs.
//! A parallel latency model for an idealized ASIC runs alongside; phase B
//! of the generator tops that model up separately.
//!
//! All state here is discarded once a program is produced.

use randmath_spec::{Opcode, ALU_COUNT, NUM_REGISTERS, TOTAL_LATENCY, VARIABLE_REGISTERS};

/// A register may not go more than this many cycles past its last write
/// without being written again; candidates that would exceed it are
/// rejected. Empirically tuned protocol constant.
pub const MAX_STALE_CYCLES: usize = 7;

/// History word for constant registers. Constant sources all share one
/// "value id" because repeating an operation against any two constants is
/// equally optimizable into a single operation.
const CONST_HISTORY: u32 = 0xFF_FFFF;

/// Outcome of an issue-slot search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSearch {
    /// A free ALU was found at the given cycle.
    Found { cycle: usize, alu: usize },
    /// No slot exists below the latency target.
    Exhausted,
}

impl SlotSearch {
    /// Cycle the candidate would issue at; the latency target itself when
    /// the search ran out of cycles.
    pub fn issue_cycle(self) -> usize {
        match self {
            SlotSearch::Found { cycle, .. } => cycle,
            SlotSearch::Exhausted => TOTAL_LATENCY,
        }
    }
}

/// Scheduling state for one generation attempt.
pub struct Scheduler {
    /// Cycle at which each register's value is next available (real CPU).
    latency: [usize; NUM_REGISTERS],
    /// Same, for the idealized fully-parallel target.
    asic_latency: [usize; NUM_REGISTERS],
    /// ALU occupancy per issue cycle. Only the first cycle of an
    /// instruction occupies a slot; ALUs are fully pipelined.
    alu_busy: [[bool; ALU_COUNT]; TOTAL_LATENCY + 1],
    /// Per-register history: bits 0-7 value id of the destination, bits
    /// 8-15 last opcode, bits 16-23 value id of the last source.
    inst_data: [u32; NUM_REGISTERS],
    /// Whether each variable register currently holds an unretired rotation.
    rotated: [bool; VARIABLE_REGISTERS],
    rotate_count: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        let mut inst_data = [CONST_HISTORY; NUM_REGISTERS];
        for (i, slot) in inst_data.iter_mut().take(VARIABLE_REGISTERS).enumerate() {
            *slot = i as u32;
        }
        Self {
            latency: [0; NUM_REGISTERS],
            asic_latency: [0; NUM_REGISTERS],
            alu_busy: [[false; ALU_COUNT]; TOTAL_LATENCY + 1],
            inst_data,
            rotated: [false; VARIABLE_REGISTERS],
            rotate_count: 0,
        }
    }

    /// True while any variable register is below the real-CPU latency
    /// target (phase A keeps scheduling until this turns false).
    pub fn any_variable_below_target(&self) -> bool {
        self.latency[..VARIABLE_REGISTERS]
            .iter()
            .any(|&l| l < TOTAL_LATENCY)
    }

    /// True while every variable register is below the ASIC latency target
    /// (phase B keeps appending until one reaches it).
    pub fn all_variables_below_asic_target(&self) -> bool {
        self.asic_latency[..VARIABLE_REGISTERS]
            .iter()
            .all(|&l| l < TOTAL_LATENCY)
    }

    /// Indices of the variable registers with the lowest and highest ASIC
    /// latency (ties resolve to the lowest index).
    pub fn asic_latency_extremes(&self) -> (usize, usize) {
        let mut min_idx = 0;
        let mut max_idx = 0;
        for i in 1..VARIABLE_REGISTERS {
            if self.asic_latency[i] < self.asic_latency[min_idx] {
                min_idx = i;
            }
            if self.asic_latency[i] > self.asic_latency[max_idx] {
                max_idx = i;
            }
        }
        (min_idx, max_idx)
    }

    /// Whether `dst` holds a rotation that no later write has retired.
    /// Rotating it again would collapse into a single rotation.
    pub fn rotation_pending(&self, dst: usize) -> bool {
        self.rotated[dst]
    }

    /// Whether the candidate exactly repeats the destination's last
    /// non-multiply instruction with the same source value.
    ///
    /// Those pairs are optimizable and therefore rejected:
    /// `2x add(a, b, C)` folds to `add(a, 2b, C1+C2)`, same for sub and
    /// rotations, and `2x xor(a, b)` is a no-op.
    pub fn is_redundant(&self, op: Opcode, dst: usize, src: usize) -> bool {
        op != Opcode::Mul
            && (self.inst_data[dst] & 0xFF_FF00)
                == ((op.to_u8() as u32) << 8) + ((self.inst_data[src] & 0xFF) << 16)
    }

    /// Scan forward from the operands' readiness for a free execution slot.
    ///
    /// ALUs are probed from the highest index down. An addition needs its
    /// slot free on the following cycle as well (it issues as two 1-cycle
    /// halves), and a rotation cannot start before every previously issued
    /// rotation has retired.
    pub fn find_slot(&self, op: Opcode, dst: usize, src: usize) -> SlotSearch {
        let mut cycle = self.latency[dst].max(self.latency[src]);
        while cycle < TOTAL_LATENCY {
            for alu in (0..op.alu_count()).rev() {
                if self.alu_busy[cycle][alu] {
                    continue;
                }
                if op == Opcode::Add && self.alu_busy[cycle + 1][alu] {
                    continue;
                }
                if op.is_rotation() && cycle < self.rotate_count * op.latency() {
                    continue;
                }
                return SlotSearch::Found { cycle, alu };
            }
            cycle += 1;
        }
        SlotSearch::Exhausted
    }

    /// Candidate would leave `dst` unwritten for too long if issued at
    /// `cycle`.
    pub fn too_stale(&self, dst: usize, cycle: usize) -> bool {
        cycle > self.latency[dst] + MAX_STALE_CYCLES
    }

    /// Commit an accepted instruction issued at `cycle` on `alu`.
    ///
    /// `program_index` is the instruction's position in the program, used
    /// as the destination's new value id.
    pub fn commit(
        &mut self,
        op: Opcode,
        dst: usize,
        src: usize,
        cycle: usize,
        alu: usize,
        program_index: usize,
    ) {
        if op.is_rotation() {
            self.rotate_count += 1;
        }

        self.alu_busy[cycle][alu] = true;
        self.latency[dst] = cycle + op.latency();

        // The ASIC has unlimited ALUs, so its model is pure dataflow
        self.asic_latency[dst] =
            self.asic_latency[dst].max(self.asic_latency[src]) + op.asic_latency();

        self.rotated[dst] = op.is_rotation();
        self.inst_data[dst] = program_index as u32
            + ((op.to_u8() as u32) << 8)
            + ((self.inst_data[src] & 0xFF) << 16);

        if op == Opcode::Add {
            // Second half of the addition occupies the same ALU next cycle
            self.alu_busy[cycle + 1][alu] = true;
        }
    }

    /// Account for a phase-B filler instruction: both models advance from
    /// the fastest register's latency, no ALU bookkeeping.
    pub fn commit_asic_fill(&mut self, op: Opcode, dst: usize, src: usize) {
        self.latency[dst] = self.latency[src] + op.latency();
        self.asic_latency[dst] = self.asic_latency[src] + op.asic_latency();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sched = Scheduler::new();
        assert!(sched.any_variable_below_target());
        assert!(sched.all_variables_below_asic_target());
        assert!(!sched.rotation_pending(0));
        assert_eq!(sched.asic_latency_extremes(), (0, 0));
    }

    #[test]
    fn test_find_slot_prefers_highest_alu() {
        let sched = Scheduler::new();
        assert_eq!(
            sched.find_slot(Opcode::Xor, 0, 1),
            SlotSearch::Found {
                cycle: 0,
                alu: ALU_COUNT - 1
            }
        );
        // Multiply can only use ALU 0
        assert_eq!(
            sched.find_slot(Opcode::Mul, 0, 1),
            SlotSearch::Found { cycle: 0, alu: 0 }
        );
    }

    #[test]
    fn test_busy_alu_pushes_issue_forward() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Mul, 0, 4, 0, 0, 0);
        // ALU 0 busy at cycle 0, and r0 not ready until cycle 3
        assert_eq!(
            sched.find_slot(Opcode::Mul, 0, 4),
            SlotSearch::Found { cycle: 3, alu: 0 }
        );
        // A different destination sees the busy slot, not the latency
        assert_eq!(
            sched.find_slot(Opcode::Mul, 1, 4),
            SlotSearch::Found { cycle: 1, alu: 0 }
        );
    }

    #[test]
    fn test_add_reserves_following_cycle() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Add, 0, 4, 0, ALU_COUNT - 1, 0);
        // Cycles 0 and 1 are both taken on that ALU
        assert_eq!(
            sched.find_slot(Opcode::Add, 1, 5),
            SlotSearch::Found {
                cycle: 0,
                alu: ALU_COUNT - 2
            }
        );
    }

    #[test]
    fn test_rotation_throughput_bound() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Ror, 0, 4, 0, ALU_COUNT - 1, 0);
        // Next rotation cannot start before rotate_count * latency = 2
        let slot = sched.find_slot(Opcode::Ror, 1, 5);
        assert_eq!(
            slot,
            SlotSearch::Found {
                cycle: 2,
                alu: ALU_COUNT - 1
            }
        );
    }

    #[test]
    fn test_rotation_pending_cleared_by_other_write() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Ror, 2, 4, 0, 2, 0);
        assert!(sched.rotation_pending(2));
        sched.commit(Opcode::Mul, 2, 4, 2, 0, 1);
        assert!(!sched.rotation_pending(2));
    }

    #[test]
    fn test_redundant_pair_detection() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Xor, 0, 1, 0, 2, 0);
        // Same xor against the same source value is a no-op pair
        assert!(sched.is_redundant(Opcode::Xor, 0, 1));
        // Different source value id, different opcode, or multiply: fine
        assert!(!sched.is_redundant(Opcode::Xor, 0, 2));
        assert!(!sched.is_redundant(Opcode::Sub, 0, 1));
        assert!(!sched.is_redundant(Opcode::Mul, 0, 1));
    }

    #[test]
    fn test_constant_sources_share_history_id() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Sub, 1, 4, 0, 2, 0);
        // Any constant source matches: both would fold the same way
        assert!(sched.is_redundant(Opcode::Sub, 1, 7));
        assert!(sched.is_redundant(Opcode::Sub, 1, 8));
        // A variable source has its own value id
        assert!(!sched.is_redundant(Opcode::Sub, 1, 2));
    }

    #[test]
    fn test_staleness_bound() {
        let sched = Scheduler::new();
        assert!(!sched.too_stale(0, MAX_STALE_CYCLES));
        assert!(sched.too_stale(0, MAX_STALE_CYCLES + 1));
    }

    #[test]
    fn test_exhausted_search_reports_target_cycle() {
        let mut sched = Scheduler::new();
        // Saturate the multiply ALU across the whole window
        for cycle in 0..TOTAL_LATENCY {
            sched.alu_busy[cycle][0] = true;
        }
        let slot = sched.find_slot(Opcode::Mul, 0, 4);
        assert_eq!(slot, SlotSearch::Exhausted);
        assert_eq!(slot.issue_cycle(), TOTAL_LATENCY);
    }

    #[test]
    fn test_asic_model_is_dataflow_only() {
        let mut sched = Scheduler::new();
        sched.commit(Opcode::Mul, 0, 4, 0, 0, 0);
        sched.commit(Opcode::Mul, 1, 0, 3, 0, 1);
        // r1 depends on r0 (ready at asic cycle 3), so 3 + 3
        assert_eq!(sched.asic_latency[1], 6);
        // Independent op on r2 issues from cycle 0 in the ASIC model even
        // though the real multiply ALU was busy
        sched.commit(Opcode::Mul, 2, 4, 6, 0, 2);
        assert_eq!(sched.asic_latency[2], 3);
    }
}
