//! # instruction
//!
//! Decoding is split from execution: every 16-bit word maps onto exactly one
//! `Instruction`, including the ones that don't mean anything, so the
//! interpreter only ever has to deal with a closed set of cases.
//!
//! Operand fields, as named in the usual CHIP-8 references:
//!  x   = bits 8-11 (a register)
//!  y   = bits 4-7  (a register)
//!  n   = bits 0-3
//!  kk  = bits 0-7  (an immediate byte)
//!  nnn = bits 0-11 (an address)
use std::fmt;

/// register-to-register operations in the 8xyN family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Assign,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubNeg,
    ShiftLeft,
}

impl AluOp {
    fn from_n(n: u16) -> Option<Self> {
        match n {
            0x0 => Some(Self::Assign),
            0x1 => Some(Self::Or),
            0x2 => Some(Self::And),
            0x3 => Some(Self::Xor),
            0x4 => Some(Self::Add),
            0x5 => Some(Self::Sub),
            0x6 => Some(Self::ShiftRight),
            0x7 => Some(Self::SubNeg),
            0xe => Some(Self::ShiftLeft),
            _ => None,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Self::Assign => "LD",
            Self::Or => "OR",
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::ShiftRight => "SHR",
            Self::SubNeg => "SUBN",
            Self::ShiftLeft => "SHL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipEqImm { x: usize, kk: u8 },
    /// 4xkk
    SkipNeImm { x: usize, kk: u8 },
    /// 5xyN; the low nibble is ignored
    SkipEqReg { x: usize, y: usize },
    /// 6xkk
    LoadImm { x: usize, kk: u8 },
    /// 7xkk
    AddImm { x: usize, kk: u8 },
    /// 8xyN
    Alu { op: AluOp, x: usize, y: usize },
    /// 9xyN; the low nibble is ignored
    SkipNeReg { x: usize, y: usize },
    /// Annn
    LoadIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxkk
    Random { x: usize, kk: u8 },
    /// Dxyn
    Draw { x: usize, y: usize, n: u8 },
    /// Ex9E
    SkipKeyPressed(usize),
    /// ExA1
    SkipKeyNotPressed(usize),
    /// Fx07
    LoadDelay(usize),
    /// Fx0A
    WaitKey(usize),
    /// Fx15
    SetDelay(usize),
    /// Fx18
    SetSound(usize),
    /// Fx1E
    AddIndex(usize),
    /// Fx29
    LoadGlyph(usize),
    /// Fx33
    StoreBcd(usize),
    /// Fx55
    StoreRegs(usize),
    /// Fx65
    LoadRegs(usize),
    /// anything else; executes as a no-op
    Unknown(u16),
}

impl Instruction {
    pub fn decode(opcode: u16) -> Self {
        let x = ((opcode & 0x0f00) >> 8) as usize;
        let y = ((opcode & 0x00f0) >> 4) as usize;
        let n = opcode & 0x000f;
        let kk = (opcode & 0x00ff) as u8;
        let nnn = opcode & 0x0fff;

        match opcode & 0xf000 {
            0x0000 => match opcode {
                0x00e0 => Self::ClearScreen,
                0x00ee => Self::Return,
                _ => Self::Unknown(opcode),
            },
            0x1000 => Self::Jump(nnn),
            0x2000 => Self::Call(nnn),
            0x3000 => Self::SkipEqImm { x, kk },
            0x4000 => Self::SkipNeImm { x, kk },
            0x5000 => Self::SkipEqReg { x, y },
            0x6000 => Self::LoadImm { x, kk },
            0x7000 => Self::AddImm { x, kk },
            0x8000 => match AluOp::from_n(n) {
                Some(op) => Self::Alu { op, x, y },
                None => Self::Unknown(opcode),
            },
            0x9000 => Self::SkipNeReg { x, y },
            0xa000 => Self::LoadIndex(nnn),
            0xb000 => Self::JumpOffset(nnn),
            0xc000 => Self::Random { x, kk },
            0xd000 => Self::Draw { x, y, n: n as u8 },
            0xe000 => match kk {
                0x9e => Self::SkipKeyPressed(x),
                0xa1 => Self::SkipKeyNotPressed(x),
                _ => Self::Unknown(opcode),
            },
            0xf000 => match kk {
                0x07 => Self::LoadDelay(x),
                0x0a => Self::WaitKey(x),
                0x15 => Self::SetDelay(x),
                0x18 => Self::SetSound(x),
                0x1e => Self::AddIndex(x),
                0x29 => Self::LoadGlyph(x),
                0x33 => Self::StoreBcd(x),
                0x55 => Self::StoreRegs(x),
                0x65 => Self::LoadRegs(x),
                _ => Self::Unknown(opcode),
            },
            _ => Self::Unknown(opcode),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ClearScreen => write!(f, "CLS"),
            Self::Return => write!(f, "RET"),
            Self::Jump(nnn) => write!(f, "JP {:#05x}", nnn),
            Self::Call(nnn) => write!(f, "CALL {:#05x}", nnn),
            Self::SkipEqImm { x, kk } => write!(f, "SE V{:X}, {:#04x}", x, kk),
            Self::SkipNeImm { x, kk } => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            Self::SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Self::LoadImm { x, kk } => write!(f, "LD V{:X}, {:#04x}", x, kk),
            Self::AddImm { x, kk } => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            Self::Alu { op, x, y } => write!(f, "{} V{:X}, V{:X}", op.mnemonic(), x, y),
            Self::SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Self::LoadIndex(nnn) => write!(f, "LD I, {:#05x}", nnn),
            Self::JumpOffset(nnn) => write!(f, "JP V0, {:#05x}", nnn),
            Self::Random { x, kk } => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Self::Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Self::SkipKeyPressed(x) => write!(f, "SKP V{:X}", x),
            Self::SkipKeyNotPressed(x) => write!(f, "SKNP V{:X}", x),
            Self::LoadDelay(x) => write!(f, "LD V{:X}, DT", x),
            Self::WaitKey(x) => write!(f, "LD V{:X}, K", x),
            Self::SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            Self::SetSound(x) => write!(f, "LD ST, V{:X}", x),
            Self::AddIndex(x) => write!(f, "ADD I, V{:X}", x),
            Self::LoadGlyph(x) => write!(f, "LD F, V{:X}", x),
            Self::StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            Self::StoreRegs(x) => write!(f, "LD [I], V{:X}", x),
            Self::LoadRegs(x) => write!(f, "LD V{:X}, [I]", x),
            Self::Unknown(opcode) => write!(f, "??? {:04x}", opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fields() {
        assert_eq!(
            Instruction::decode(0xd125),
            Instruction::Draw { x: 1, y: 2, n: 5 }
        );
        assert_eq!(
            Instruction::decode(0x3a7f),
            Instruction::SkipEqImm { x: 0xa, kk: 0x7f }
        );
        assert_eq!(Instruction::decode(0xa22a), Instruction::LoadIndex(0x22a));
        assert_eq!(Instruction::decode(0x2fff), Instruction::Call(0xfff));
    }

    #[test]
    fn test_decode_system() {
        assert_eq!(Instruction::decode(0x00e0), Instruction::ClearScreen);
        assert_eq!(Instruction::decode(0x00ee), Instruction::Return);
        // 0nnn machine code calls are not supported
        assert_eq!(Instruction::decode(0x0123), Instruction::Unknown(0x0123));
    }

    #[test]
    fn test_decode_alu() {
        let ops = [
            (0x8120, AluOp::Assign),
            (0x8121, AluOp::Or),
            (0x8122, AluOp::And),
            (0x8123, AluOp::Xor),
            (0x8124, AluOp::Add),
            (0x8125, AluOp::Sub),
            (0x8126, AluOp::ShiftRight),
            (0x8127, AluOp::SubNeg),
            (0x812e, AluOp::ShiftLeft),
        ];
        for (opcode, op) in ops {
            assert_eq!(Instruction::decode(opcode), Instruction::Alu { op, x: 1, y: 2 });
        }
        for opcode in [0x8128, 0x812d, 0x812f] {
            assert_eq!(Instruction::decode(opcode), Instruction::Unknown(opcode));
        }
    }

    #[test]
    fn test_decode_register_compare_ignores_low_nibble() {
        assert_eq!(
            Instruction::decode(0x5120),
            Instruction::SkipEqReg { x: 1, y: 2 }
        );
        assert_eq!(
            Instruction::decode(0x5121),
            Instruction::SkipEqReg { x: 1, y: 2 }
        );
        assert_eq!(
            Instruction::decode(0x9ab0),
            Instruction::SkipNeReg { x: 0xa, y: 0xb }
        );
        assert_eq!(
            Instruction::decode(0x9abf),
            Instruction::SkipNeReg { x: 0xa, y: 0xb }
        );
    }

    #[test]
    fn test_decode_key_and_misc() {
        assert_eq!(Instruction::decode(0xe39e), Instruction::SkipKeyPressed(3));
        assert_eq!(Instruction::decode(0xe3a1), Instruction::SkipKeyNotPressed(3));
        assert_eq!(Instruction::decode(0xe3a2), Instruction::Unknown(0xe3a2));
        assert_eq!(Instruction::decode(0xf40a), Instruction::WaitKey(4));
        assert_eq!(Instruction::decode(0xf533), Instruction::StoreBcd(5));
        assert_eq!(Instruction::decode(0xff55), Instruction::StoreRegs(0xf));
        assert_eq!(Instruction::decode(0xf065), Instruction::LoadRegs(0));
        assert_eq!(Instruction::decode(0xf0ff), Instruction::Unknown(0xf0ff));
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::decode(0x00e0).to_string(), "CLS");
        assert_eq!(Instruction::decode(0x6a2a).to_string(), "LD VA, 0x2a");
        assert_eq!(Instruction::decode(0xd015).to_string(), "DRW V0, V1, 5");
        assert_eq!(Instruction::decode(0x1200).to_string(), "JP 0x200");
        assert_eq!(Instruction::decode(0x812e).to_string(), "SHL V1, V2");
        assert_eq!(Instruction::decode(0xffff).to_string(), "??? ffff");
    }
}
