//! Minimal AArch64 decoder.
//!
//! Only the move-wide family and `BL` are recognised, everything else is
//! reported as [Instruction::Unknown].
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A general purpose register
pub struct Register {
    pub index: u8,
    /// `x` register when set, `w` register otherwise
    pub wide: bool,
}

impl Register {
    pub const fn w(index: u8) -> Self {
        Self { index, wide: false }
    }

    pub const fn x(index: u8) -> Self {
        Self { index, wide: true }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.wide { 'x' } else { 'w' };
        if self.index == 31 {
            write!(f, "{}zr", prefix)
        } else {
            write!(f, "{}{}", prefix, self.index)
        }
    }
}

impl std::str::FromStr for Register {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (wide, rest) = match s.split_at_checked(1) {
            Some(("w", rest)) => (false, rest),
            Some(("x", rest)) => (true, rest),
            _ => return Err(format!("Invalid register: {}", s)),
        };
        let index = if rest == "zr" {
            31
        } else {
            match rest.parse::<u8>() {
                Ok(i) if i < 31 => i,
                _ => return Err(format!("Invalid register: {}", s)),
            }
        };
        Ok(Self { index, wide })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveWideOp {
    /// Move wide with NOT
    Movn,
    /// Move wide with zero
    Movz,
    /// Move wide with keep
    Movk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    MoveWide {
        op: MoveWideOp,
        rd: Register,
        imm16: u16,
        /// 16-bit lane the immediate is written to (`lsl #hw*16`)
        hw: u8,
    },
    /// Branch with link; `offset` is relative to the instruction.
    Bl { offset: i32 },
    Unknown(u32),
}

impl Instruction {
    pub fn decode(word: u32) -> Self {
        if word & 0xFC00_0000 == 0x9400_0000 {
            // imm26, sign extended and scaled by 4
            let offset = ((word << 6) as i32) >> 4;
            return Instruction::Bl { offset };
        }
        if word & 0x1F80_0000 == 0x1280_0000 {
            let wide = word >> 31 != 0;
            let op = match (word >> 29) & 0b11 {
                0b00 => MoveWideOp::Movn,
                0b10 => MoveWideOp::Movz,
                0b11 => MoveWideOp::Movk,
                _ => return Instruction::Unknown(word),
            };
            let hw = ((word >> 21) & 0b11) as u8;
            if !wide && hw > 1 {
                return Instruction::Unknown(word);
            }
            return Instruction::MoveWide {
                op,
                rd: Register {
                    index: (word & 0x1F) as u8,
                    wide,
                },
                imm16: ((word >> 5) & 0xFFFF) as u16,
                hw,
            };
        }
        Instruction::Unknown(word)
    }

    /// Decodes the little-endian word at the start of `bytes`.
    ///
    /// Returns `None` if fewer than 4 bytes are available.
    pub fn decode_bytes(bytes: &[u8]) -> Option<Self> {
        let word: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Self::decode(u32::from_le_bytes(word)))
    }

    /// The value a `mov` alias (MOVZ or MOVN) leaves in its destination
    /// register, truncated to the register width.
    pub fn move_immediate(&self) -> Option<(Register, u64)> {
        match *self {
            Instruction::MoveWide {
                op,
                rd,
                imm16,
                hw,
            } => {
                let shifted = (imm16 as u64) << (hw as u32 * 16);
                let mask = if rd.wide { u64::MAX } else { 0xFFFF_FFFF };
                match op {
                    MoveWideOp::Movz => Some((rd, shifted)),
                    MoveWideOp::Movn => Some((rd, !shifted & mask)),
                    MoveWideOp::Movk => None,
                }
            }
            _ => None,
        }
    }

    pub fn is_bl(&self) -> bool {
        matches!(self, Instruction::Bl { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::MoveWide {
                op,
                rd,
                imm16,
                hw,
            } => {
                let name = match op {
                    MoveWideOp::Movn => "movn",
                    MoveWideOp::Movz => "movz",
                    MoveWideOp::Movk => "movk",
                };
                write!(f, "{} {}, #{:#x}", name, rd, imm16)?;
                if hw != 0 {
                    write!(f, ", lsl #{}", hw as u32 * 16)?;
                }
                Ok(())
            }
            Instruction::Bl { offset } => {
                if offset < 0 {
                    write!(f, "bl #-{:#x}", offset.unsigned_abs())
                } else {
                    write!(f, "bl #{:#x}", offset)
                }
            }
            Instruction::Unknown(word) => write!(f, ".inst {:#010x}", word),
        }
    }
}
