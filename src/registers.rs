use crate::error::{Chip8Error, Result};

/// how many general purpose registers V0-VF
pub const REGISTER_COUNT: usize = 16;

/// how deep subroutine calls can nest
pub const STACK_DEPTH: usize = 16;

/// where execution starts after a reset
pub const PROGRAM_START: u16 = 0x0200;

/// PC and I only ever address 12 bits
pub const ADDR_MASK: u16 = 0x0fff;

/// the flag register, VF
pub const VF: usize = 0xf;

/// CPU state: V0-VF, I, PC, the call stack and the two timers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    v: [u8; REGISTER_COUNT],
    i: u16,
    pc: u16,
    // number of occupied stack slots; the next push lands at stack[sp]
    sp: u16,
    stack: [u16; STACK_DEPTH],
    dt: u8,
    st: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; REGISTER_COUNT],
            i: 0x0000,
            pc: PROGRAM_START,
            sp: 0,
            stack: [0; STACK_DEPTH],
            dt: 0,
            st: 0,
        }
    }

    pub fn v(&self, index: usize) -> Result<u8> {
        self.v.get(index).copied().ok_or(Chip8Error::InvalidIndex {
            kind: "register",
            index,
        })
    }

    pub fn set_v(&mut self, index: usize, value: u8) -> Result<()> {
        let reg = self.v.get_mut(index).ok_or(Chip8Error::InvalidIndex {
            kind: "register",
            index,
        })?;
        *reg = value;
        Ok(())
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, value: u16) {
        self.i = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, addr: u16) {
        self.pc = addr & ADDR_MASK;
    }

    /// move on `count` instructions; each one is 2 bytes
    pub fn advance(&mut self, count: u16) {
        self.set_pc(self.pc.wrapping_add(2 * count));
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn stack(&self, index: usize) -> Result<u16> {
        self.stack.get(index).copied().ok_or(Chip8Error::InvalidIndex {
            kind: "stack",
            index,
        })
    }

    pub fn set_stack(&mut self, index: usize, addr: u16) -> Result<()> {
        let slot = self.stack.get_mut(index).ok_or(Chip8Error::InvalidIndex {
            kind: "stack",
            index,
        })?;
        *slot = addr;
        Ok(())
    }

    /// push a return address; a full stack is left untouched
    pub fn push(&mut self, addr: u16) -> Result<()> {
        let depth = self.sp as usize;
        if depth >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow { depth });
        }
        self.set_stack(depth, addr)?;
        self.sp += 1;
        Ok(())
    }

    /// pop the most recent return address
    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        let addr = self.stack(self.sp as usize - 1)?;
        self.sp -= 1;
        Ok(addr)
    }

    pub fn dt(&self) -> u8 {
        self.dt
    }

    pub fn set_dt(&mut self, value: u8) {
        self.dt = value;
    }

    pub fn st(&self) -> u8 {
        self.st
    }

    pub fn set_st(&mut self, value: u8) {
        self.st = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let r = Registers::new();
        assert_eq!(r.pc(), 0x200);
        assert_eq!(r.i(), 0);
        assert_eq!(r.sp(), 0);
        assert_eq!((r.dt(), r.st()), (0, 0));
    }

    #[test]
    fn test_register_get_set() -> Result<()> {
        let mut r = Registers::new();
        for idx in 0..REGISTER_COUNT {
            r.set_v(idx, idx as u8 * 3)?;
        }
        assert_eq!(r.v(0xa)?, 30);
        assert_eq!(r.v(VF)?, 45);
        Ok(())
    }

    #[test]
    fn test_register_out_of_range() {
        let mut r = Registers::new();
        assert!(matches!(
            r.v(16),
            Err(Chip8Error::InvalidIndex { kind: "register", index: 16 })
        ));
        assert!(r.set_v(99, 1).is_err());
        assert!(r.stack(16).is_err());
        assert!(r.set_stack(16, 0x300).is_err());
    }

    #[test]
    fn test_advance() {
        let mut r = Registers::new();
        r.advance(1);
        assert_eq!(r.pc(), 0x202);
        r.advance(2);
        assert_eq!(r.pc(), 0x206);
    }

    #[test]
    fn test_pc_stays_in_address_space() {
        let mut r = Registers::new();
        r.set_pc(0x0ffe);
        r.advance(1);
        assert_eq!(r.pc(), 0x000);
        r.set_pc(0x1234);
        assert_eq!(r.pc(), 0x234);
    }

    #[test]
    fn test_push_pop() -> Result<()> {
        let mut r = Registers::new();
        r.push(0x200)?;
        r.push(0x300)?;
        assert_eq!(r.sp(), 2);
        assert_eq!(r.pop()?, 0x300);
        assert_eq!(r.pop()?, 0x200);
        assert!(matches!(r.pop(), Err(Chip8Error::StackUnderflow)));
        Ok(())
    }

    #[test]
    fn test_full_stack_rejects_push() -> Result<()> {
        let mut r = Registers::new();
        for n in 0..STACK_DEPTH as u16 {
            r.push(0x200 + 2 * n)?;
        }
        let before = r.clone();
        assert!(matches!(
            r.push(0xabc),
            Err(Chip8Error::StackOverflow { depth: 16 })
        ));
        assert_eq!(r, before);
        Ok(())
    }
}
