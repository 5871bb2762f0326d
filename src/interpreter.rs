/// # interpreter
///
/// Owns the register file and memory for the lifetime of a run, and holds
/// handles on the framebuffer (read by the renderer) and keypad (written by
/// the host). One call to `tick` is one scheduler beat:
///
///  1. DT and ST count down if non-zero
///  2. the big-endian word at PC is fetched
///  3. it is decoded into an `Instruction`
///  4. the instruction is executed; unless it set PC itself it moves PC on
///
/// A fault while executing (a sprite hanging off the top of memory, a 17th
/// nested call, ...) is logged and turns the tick into a no-op, so that PC
/// stays put and nothing is half-written.
use std::io;

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::framebuffer::{self, Framebuffer, SharedFramebuffer};
use crate::instruction::{AluOp, Instruction};
use crate::keypad::{Keypad, SharedKeypad};
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_FONT_ADDR, CHIP8_FONT_GLYPH_BYTES};
use crate::registers::{Registers, ADDR_MASK, VF};
use crate::sound::ToneChange;

/// Fx0A scans keys 0-E, as the reference interpreter does
const WAIT_KEY_LIMIT: u8 = 0xf;

/// sprites are always a byte wide
const SPRITE_WIDTH: usize = 8;

pub struct Chip8Interpreter {
    registers: Registers,
    memory: Chip8MemoryMap,
    framebuffer: SharedFramebuffer,
    keypad: SharedKeypad,
    rng: StdRng,
    seed: Option<u64>,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl Chip8Interpreter {
    /// a powered-on machine with no program; `seed` fixes what Cxkk produces
    pub fn new(seed: Option<u64>) -> Self {
        Chip8Interpreter {
            registers: Registers::new(),
            memory: Chip8MemoryMap::new(),
            framebuffer: Framebuffer::shared(),
            keypad: Keypad::shared(),
            rng: make_rng(seed),
            seed,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    /// handle for the renderer
    pub fn framebuffer(&self) -> SharedFramebuffer {
        SharedFramebuffer::clone(&self.framebuffer)
    }

    /// handle for the host input
    pub fn keypad(&self) -> SharedKeypad {
        SharedKeypad::clone(&self.keypad)
    }

    /// back to power-on state; the shared framebuffer and keypad are cleared
    /// in place so existing handles stay valid
    pub fn reset(&mut self) {
        self.registers = Registers::new();
        self.memory = Chip8MemoryMap::new();
        framebuffer::lock(&self.framebuffer).clear();
        self.keypad.release_all();
        self.rng = make_rng(self.seed);
    }

    /// reset and load a chip8 program; a program that doesn't fit is
    /// rejected before anything is touched
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let mut memory = Chip8MemoryMap::new();
        memory.load_program(program)?;
        self.reset();
        self.memory = memory;
        info!("loaded {} byte program", program.len());
        Ok(())
    }

    /// load a chip8 program from a file or whatever
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_program(&buf)
    }

    /// the instruction word at PC
    pub fn fetch(&self) -> Result<u16> {
        self.memory.read_word(self.registers.pc())
    }

    /// count the timers down; reports when the sound timer runs out
    pub fn decay_timers(&mut self) -> Option<ToneChange> {
        let dt = self.registers.dt();
        if dt > 0 {
            self.registers.set_dt(dt - 1);
        }
        match self.registers.st() {
            0 => None,
            st => {
                self.registers.set_st(st - 1);
                (st == 1).then_some(ToneChange::Stop)
            }
        }
    }

    /// fetch, decode and execute one instruction
    pub fn step(&mut self) -> Result<Instruction> {
        let pc = self.registers.pc();
        let opcode = self.fetch()?;
        let inst = Instruction::decode(opcode);
        trace!("{:03x}: {:04x}  {}", pc, opcode, inst);
        self.execute(inst)?;
        Ok(inst)
    }

    /// one instruction, with faults logged and swallowed
    pub fn cycle(&mut self) -> Option<ToneChange> {
        let st = self.registers.st();
        if let Err(e) = self.step() {
            warn!("{:03x}: {}", self.registers.pc(), e);
        }
        (st == 0 && self.registers.st() > 0).then_some(ToneChange::Start)
    }

    /// timers, then one instruction
    pub fn tick(&mut self) -> Option<ToneChange> {
        let decayed = self.decay_timers();
        self.cycle().or(decayed)
    }

    fn v(&self, x: usize) -> Result<u8> {
        self.registers.v(x)
    }

    fn set_v(&mut self, x: usize, value: u8) -> Result<()> {
        self.registers.set_v(x, value)
    }

    fn skip_if(&mut self, cond: bool) {
        self.registers.advance(if cond { 2 } else { 1 });
    }

    /// carry out an already decoded instruction
    pub fn execute(&mut self, inst: Instruction) -> Result<()> {
        match inst {
            Instruction::ClearScreen => {
                let mut fb = framebuffer::lock(&self.framebuffer);
                fb.clear();
                fb.set_full_redraw(true);
                drop(fb);
                self.registers.advance(1);
            }
            Instruction::Return => {
                let addr = self.registers.pop()?;
                self.registers.set_pc(addr);
                self.registers.advance(1);
            }
            Instruction::Jump(nnn) => self.registers.set_pc(nnn),
            Instruction::Call(nnn) => {
                self.registers.push(self.registers.pc())?;
                self.registers.set_pc(nnn);
            }
            Instruction::SkipEqImm { x, kk } => {
                let cond = self.v(x)? == kk;
                self.skip_if(cond);
            }
            Instruction::SkipNeImm { x, kk } => {
                let cond = self.v(x)? != kk;
                self.skip_if(cond);
            }
            Instruction::SkipEqReg { x, y } => {
                let cond = self.v(x)? == self.v(y)?;
                self.skip_if(cond);
            }
            Instruction::LoadImm { x, kk } => {
                self.set_v(x, kk)?;
                self.registers.advance(1);
            }
            Instruction::AddImm { x, kk } => {
                let vx = self.v(x)?;
                self.set_v(x, vx.wrapping_add(kk))?;
                self.registers.advance(1);
            }
            Instruction::Alu { op, x, y } => {
                self.alu(op, x, y)?;
                self.registers.advance(1);
            }
            Instruction::SkipNeReg { x, y } => {
                let cond = self.v(x)? != self.v(y)?;
                self.skip_if(cond);
            }
            Instruction::LoadIndex(nnn) => {
                self.registers.set_i(nnn);
                self.registers.advance(1);
            }
            Instruction::JumpOffset(nnn) => {
                let v0 = self.v(0)? as u16;
                self.registers.set_pc(v0 + nnn);
            }
            Instruction::Random { x, kk } => {
                let r: u8 = self.rng.gen();
                self.set_v(x, r & kk)?;
                self.registers.advance(1);
            }
            Instruction::Draw { x, y, n } => {
                let (vx, vy) = (self.v(x)? as usize, self.v(y)? as usize);
                let collision = self.draw(vx, vy, n)?;
                self.set_v(VF, collision as u8)?;
                self.registers.advance(1);
            }
            Instruction::SkipKeyPressed(x) => {
                let cond = self.keypad.is_pressed(self.v(x)?);
                self.skip_if(cond);
            }
            Instruction::SkipKeyNotPressed(x) => {
                let cond = !self.keypad.is_pressed(self.v(x)?);
                self.skip_if(cond);
            }
            Instruction::LoadDelay(x) => {
                let dt = self.registers.dt();
                self.set_v(x, dt)?;
                self.registers.advance(1);
            }
            Instruction::WaitKey(x) => {
                // no key: PC stays put and we come back here next tick
                if let Some(key) = self.keypad.first_pressed(WAIT_KEY_LIMIT) {
                    self.set_v(x, key)?;
                    framebuffer::lock(&self.framebuffer).set_full_redraw(true);
                    self.registers.advance(1);
                }
            }
            Instruction::SetDelay(x) => {
                let vx = self.v(x)?;
                self.registers.set_dt(vx);
                self.registers.advance(1);
            }
            Instruction::SetSound(x) => {
                let vx = self.v(x)?;
                self.registers.set_st(vx);
                self.registers.advance(1);
            }
            Instruction::AddIndex(x) => {
                let sum = self.registers.i() + self.v(x)? as u16;
                self.registers.set_i(sum & ADDR_MASK);
                self.set_v(VF, (sum > ADDR_MASK) as u8)?;
                self.registers.advance(1);
            }
            Instruction::LoadGlyph(x) => {
                let glyph = self.v(x)? as u16 * CHIP8_FONT_GLYPH_BYTES;
                self.registers.set_i(CHIP8_FONT_ADDR + glyph);
                self.registers.advance(1);
            }
            Instruction::StoreBcd(x) => {
                let vx = self.v(x)?;
                self.memory
                    .write_slice(&[vx / 100, vx / 10 % 10, vx % 10], self.registers.i())?;
                self.registers.advance(1);
            }
            Instruction::StoreRegs(x) => {
                let values = (0..=x).map(|r| self.v(r)).collect::<Result<Vec<_>>>()?;
                self.memory.write_slice(&values, self.registers.i())?;
                self.registers.advance(1);
            }
            Instruction::LoadRegs(x) => {
                let values = self.memory.get_ro_slice(self.registers.i(), x + 1)?;
                for (r, value) in values.iter().enumerate() {
                    self.registers.set_v(r, *value)?;
                }
                self.registers.advance(1);
            }
            Instruction::Unknown(opcode) => {
                debug!("{:03x}: unknown opcode {:04x}", self.registers.pc(), opcode);
            }
        }
        Ok(())
    }

    fn alu(&mut self, op: AluOp, x: usize, y: usize) -> Result<()> {
        let vx = self.v(x)?;
        let vy = self.v(y)?;
        // the flag goes in before the result, so the result wins when x is VF
        let (result, flag) = match op {
            AluOp::Assign => (vy, None),
            AluOp::Or => (vx | vy, None),
            AluOp::And => (vx & vy, None),
            AluOp::Xor => (vx ^ vy, None),
            AluOp::Add => {
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }
            AluOp::Sub => (vx.wrapping_sub(vy), Some((vx > vy) as u8)),
            AluOp::ShiftRight => (vx >> 1, Some(vx & 0x01)),
            AluOp::SubNeg => (vy.wrapping_sub(vx), Some((vy > vx) as u8)),
            AluOp::ShiftLeft => (vx << 1, Some(vx >> 7)),
        };
        if let Some(flag) = flag {
            self.set_v(VF, flag)?;
        }
        self.set_v(x, result)
    }

    /// XOR an n-row sprite from I onto the screen at (x, y); anything off the
    /// right or bottom edge is clipped. Returns whether a lit pixel was put out.
    fn draw(&self, x: usize, y: usize, n: u8) -> Result<bool> {
        let sprite = self.memory.get_ro_slice(self.registers.i(), n as usize)?;
        let mut fb = framebuffer::lock(&self.framebuffer);
        let mut collision = false;
        for (row, &bits) in sprite.iter().enumerate() {
            for col in 0..SPRITE_WIDTH {
                if bits & (0x80u8 >> col) == 0 {
                    continue;
                }
                let (px, py) = (x + col, y + row);
                if px < framebuffer::SCREEN_WIDTH && py < framebuffer::SCREEN_HEIGHT {
                    collision |= fb.toggle_pixel(px, py);
                    fb.mark_dirty(px, py);
                }
            }
        }
        Ok(collision)
    }
}
