use std::io;

use crate::error::{Chip8Error, Result};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the flat, bounds-checked address space
pub trait MemoryMap {
    /// the whole of the underlying memory
    fn bytes(&self) -> &[u8];

    /// the whole of the underlying memory, writable
    fn bytes_mut(&mut self) -> &mut [u8];

    /// read a single byte
    fn read(&self, addr: u16) -> Result<u8> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// write a single byte; the top of memory is as out of bounds as anywhere else
    fn write(&mut self, addr: u16, value: u8) -> Result<()> {
        self.get_rw_slice(addr, 1)?[0] = value;
        Ok(())
    }

    /// big-endian two-byte word, as instructions are stored
    fn read_word(&self, addr: u16) -> Result<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// write a chunk of bytes; nothing is written unless all of it fits
    fn write_slice(&mut self, data: &[u8], addr: u16) -> Result<()> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let a = addr as usize;
        let bytes = self.bytes();
        match a.checked_add(len) {
            Some(end) if end <= bytes.len() => Ok(&bytes[a..end]),
            _ => Err(Chip8Error::InvalidAddress {
                addr: a + len.saturating_sub(1),
            }),
        }
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let a = addr as usize;
        let bytes = self.bytes_mut();
        match a.checked_add(len) {
            Some(end) if end <= bytes.len() => Ok(&mut bytes[a..end]),
            _ => Err(Chip8Error::InvalidAddress {
                addr: a + len.saturating_sub(1),
            }),
        }
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// the most program that can ever be loaded
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// glyphs live at the very bottom of memory
pub const CHIP8_FONT_ADDR: u16 = 0x000;

/// each hex digit glyph is 5 rows tall
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// Defines the CHIP-8 memory map
///   0x0000-0x004f  font glyphs 0-F
///   0x0050-0x01ff  unused (interpreter area on real hardware)
///   0x0200-0x0fff  program
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
        };
        mm.load_font();
        mm
    }

    /// copy the hex digit glyphs into 0x000-0x04f
    pub fn load_font(&mut self) {
        let start = CHIP8_FONT_ADDR as usize;
        self.bytes[start..start + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
    }

    /// load a CHIP-8 program at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > CHIP8_MAX_PROGRAM_BYTES {
            return Err(Chip8Error::OutOfSpace {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        self.write_slice(program, CHIP8_PROGRAM_ADDR)
    }

    /// load a CHIP-8 program from a file or whatever
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_program(&buf)
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
