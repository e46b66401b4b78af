//! Finds the call site that loads a 32-bit constant into a register.
//!
//! The compiler materialises a constant `K` with two move-wide instructions,
//! either as
//!
//! ```text
//! mov  w1, #0x020e
//! movk w1, #0xc99a, lsl #16
//! ...
//! bl   <callee>
//! ```
//!
//! or with the halves swapped (`mov w1, #0xc99a0000` followed by
//! `movk w1, #0x020e`). Both orders are accepted.
use super::disasm::{Instruction, MoveWideOp, Register};

/// Instructions are fixed 4 byte units.
pub const INSTRUCTION_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    /// Constant loaded right before the call
    pub constant: u32,
    /// Restrict the match to this destination register
    pub register: Option<Register>,
}

impl Pattern {
    pub fn new(constant: u32) -> Self {
        Self {
            constant,
            register: None,
        }
    }

    pub fn with_register(mut self, register: Register) -> Self {
        self.register = Some(register);
        self
    }

    fn low(&self) -> u16 {
        (self.constant & 0xFFFF) as u16
    }

    fn high(&self) -> u16 {
        (self.constant >> 16) as u16
    }

    /// Checks a `mov` and returns the MOVK lane and immediate that must follow it.
    fn start(&self, inst: &Instruction) -> Option<(Register, Lane)> {
        let (rd, value) = inst.move_immediate()?;
        if self.register.is_some_and(|r| r != rd) {
            return None;
        }
        if value == self.low() as u64 {
            Some((rd, Lane { hw: 1, imm16: self.high() }))
        } else if value == (self.high() as u64) << 16 {
            Some((rd, Lane { hw: 0, imm16: self.low() }))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A 16-bit slot of a register together with its expected contents
pub struct Lane {
    pub hw: u8,
    pub imm16: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Idle,
    /// The first half of the constant was loaded at `offset`.
    SawLow {
        offset: usize,
        register: Register,
        expect: Lane,
    },
    /// Both halves are in place, waiting for the call.
    SawHigh { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(MatchState),
    /// Match completed; holds the offset of the first `mov`.
    Found(usize),
}

impl MatchState {
    /// Advances the machine by the instruction found at `offset`.
    ///
    /// `None` stands for a word that could not be decoded; it leaves the
    /// state untouched.
    pub fn step(self, pattern: &Pattern, inst: Option<&Instruction>, offset: usize) -> Step {
        let Some(inst) = inst else {
            return Step::Continue(self);
        };
        match self {
            MatchState::Idle => match pattern.start(inst) {
                Some((register, expect)) => Step::Continue(MatchState::SawLow {
                    offset,
                    register,
                    expect,
                }),
                None => Step::Continue(MatchState::Idle),
            },
            MatchState::SawLow {
                offset: start,
                register,
                expect,
            } => match *inst {
                Instruction::MoveWide {
                    op: MoveWideOp::Movk,
                    rd,
                    imm16,
                    hw,
                } if rd == register && hw == expect.hw && imm16 == expect.imm16 => {
                    Step::Continue(MatchState::SawHigh { offset: start })
                }
                // the candidate is dropped; this instruction may begin a new one
                _ => MatchState::Idle.step(pattern, Some(inst), offset),
            },
            MatchState::SawHigh { offset: start } if inst.is_bl() => Step::Found(start),
            MatchState::SawHigh { .. } => Step::Continue(self),
        }
    }
}

/// Scans `code` for the pattern and returns the offset of its first instruction.
pub fn locate(code: &[u8], pattern: &Pattern) -> Option<usize> {
    let mut state = MatchState::Idle;
    for (index, chunk) in code.chunks_exact(INSTRUCTION_SIZE).enumerate() {
        let offset = index * INSTRUCTION_SIZE;
        let inst = Instruction::decode_bytes(chunk);
        let next = state.step(pattern, inst.as_ref(), offset);
        match next {
            Step::Found(start) => {
                log::trace!("{:#x}: call site completes match started at {:#x}", offset, start);
                return Some(start);
            }
            Step::Continue(next) => {
                if next != state {
                    log::trace!("{:#x}: {:?} -> {:?}", offset, state, next);
                }
                state = next;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: u32 = 0xC99A020E;
    const MOV_LOW: u32 = 0x528041C1; // mov w1, #0x20e
    const MOVK_HIGH: u32 = 0x72B93341; // movk w1, #0xc99a, lsl #16
    const MOV_HIGH: u32 = 0x52B93341; // mov w1, #0xc99a0000
    const MOVK_LOW: u32 = 0x728041C1; // movk w1, #0x20e
    const MOVK_HIGH_W2: u32 = 0x72B93342; // movk w2, #0xc99a, lsl #16
    const BL: u32 = 0x94000123;
    const NOP: u32 = 0xD503201F;
    const MOV_W0: u32 = 0x52800020; // mov w0, #1

    fn code(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_exact_sequence() {
        let pattern = Pattern::new(K);
        assert_eq!(locate(&code(&[MOV_LOW, MOVK_HIGH, BL]), &pattern), Some(0));
    }

    #[test]
    fn test_filler_before_call() {
        let pattern = Pattern::new(K);
        assert_eq!(
            locate(&code(&[MOV_LOW, MOVK_HIGH, NOP, BL]), &pattern),
            Some(0)
        );
        assert_eq!(
            locate(&code(&[MOV_LOW, MOVK_HIGH, MOV_W0, NOP, NOP, BL]), &pattern),
            Some(0)
        );
    }

    #[test]
    fn test_missing_call() {
        let pattern = Pattern::new(K);
        assert_eq!(locate(&code(&[MOV_LOW, MOVK_HIGH, NOP, NOP]), &pattern), None);
        assert_eq!(locate(&[], &pattern), None);
    }

    #[test]
    fn test_wrong_register_resets() {
        let pattern = Pattern::new(K);
        assert_eq!(
            locate(&code(&[MOV_LOW, MOVK_HIGH_W2, NOP, BL]), &pattern),
            None
        );
    }

    #[test]
    fn test_interrupted_pair_resets() {
        let pattern = Pattern::new(K);
        assert_eq!(
            locate(&code(&[MOV_LOW, NOP, MOVK_HIGH, BL]), &pattern),
            None
        );
    }

    #[test]
    fn test_later_match_after_failed_candidate() {
        let pattern = Pattern::new(K);
        let buf = code(&[NOP, MOV_LOW, MOVK_HIGH_W2, BL, MOV_LOW, MOVK_HIGH, NOP, BL]);
        assert_eq!(locate(&buf, &pattern), Some(16));
        // a repeated mov restarts the candidate at the newer offset
        let buf = code(&[MOV_LOW, MOV_LOW, MOVK_HIGH, BL]);
        assert_eq!(locate(&buf, &pattern), Some(4));
    }

    #[test]
    fn test_swapped_halves() {
        let pattern = Pattern::new(K);
        assert_eq!(
            locate(&code(&[NOP, MOV_HIGH, MOVK_LOW, NOP, BL]), &pattern),
            Some(4)
        );
        // lanes must be consistent with the first instruction
        assert_eq!(
            locate(&code(&[MOV_HIGH, MOVK_HIGH, BL]), &pattern),
            None
        );
    }

    #[test]
    fn test_concrete_scenario() {
        let pattern = Pattern::new(K).with_register(Register::w(1));
        let buf = code(&[MOV_LOW, MOVK_HIGH, NOP, BL]);
        assert_eq!(locate(&buf, &pattern), Some(0));
        let pattern = Pattern::new(K).with_register(Register::w(2));
        assert_eq!(locate(&buf, &pattern), None);
    }

    #[test]
    fn test_first_match_only_and_trailing_bytes() {
        let pattern = Pattern::new(K);
        let mut buf = code(&[MOV_LOW, MOVK_HIGH, BL, MOV_LOW, MOVK_HIGH, BL]);
        buf.extend_from_slice(&[0xff, 0xff]);
        assert_eq!(locate(&buf, &pattern), Some(0));
    }

    #[test]
    fn test_step_transitions() {
        let pattern = Pattern::new(K);
        let mov = Instruction::decode(MOV_LOW);
        let movk = Instruction::decode(MOVK_HIGH);
        let bl = Instruction::decode(BL);
        let nop = Instruction::decode(NOP);
        let Step::Continue(state) = MatchState::Idle.step(&pattern, Some(&mov), 8) else {
            panic!("unexpected match");
        };
        assert!(matches!(state, MatchState::SawLow { offset: 8, .. }));
        assert_eq!(
            MatchState::Idle.step(&pattern, None, 4),
            Step::Continue(MatchState::Idle)
        );
        assert_eq!(state.step(&pattern, None, 12), Step::Continue(state));
        assert_eq!(
            state.step(&pattern, Some(&Instruction::Unknown(0xffff_ffff)), 12),
            Step::Continue(MatchState::Idle)
        );
        let Step::Continue(state) = state.step(&pattern, Some(&movk), 12) else {
            panic!("unexpected match");
        };
        assert_eq!(state, MatchState::SawHigh { offset: 8 });
        assert_eq!(state.step(&pattern, None, 16), Step::Continue(state));
        assert_eq!(state.step(&pattern, Some(&nop), 16), Step::Continue(state));
        assert_eq!(state.step(&pattern, Some(&bl), 20), Step::Found(8));
    }
}
