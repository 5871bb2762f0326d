use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use crate::error::{Chip8Error, Result};

/// the hex keypad has keys 0-F
pub const KEY_COUNT: usize = 16;

/// Keypad as shared between the host input loop and the tick thread
pub type SharedKeypad = Arc<Keypad>;

/// State of the 16 logical keys, one bit each. Host events write it from one
/// thread while instructions read it from another, hence the atomic.
#[derive(Debug, Default)]
pub struct Keypad {
    keys: AtomicU16,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            keys: AtomicU16::new(0),
        }
    }

    pub fn shared() -> SharedKeypad {
        Arc::new(Self::new())
    }

    fn mask(key: u8) -> Result<u16> {
        if (key as usize) < KEY_COUNT {
            Ok(1u16 << key)
        } else {
            Err(Chip8Error::InvalidIndex {
                kind: "key",
                index: key as usize,
            })
        }
    }

    pub fn press(&self, key: u8) -> Result<()> {
        self.keys.fetch_or(Self::mask(key)?, Ordering::SeqCst);
        Ok(())
    }

    pub fn release(&self, key: u8) -> Result<()> {
        self.keys.fetch_and(!Self::mask(key)?, Ordering::SeqCst);
        Ok(())
    }

    /// keys outside 0-F are never pressed
    pub fn is_pressed(&self, key: u8) -> bool {
        Self::mask(key)
            .map(|m| self.keys.load(Ordering::SeqCst) & m != 0)
            .unwrap_or(false)
    }

    /// lowest-numbered key below `limit` that is currently down
    pub fn first_pressed(&self, limit: u8) -> Option<u8> {
        let keys = self.keys.load(Ordering::SeqCst);
        (0..limit.min(KEY_COUNT as u8)).find(|k| keys & (1u16 << *k) != 0)
    }

    pub fn release_all(&self) {
        self.keys.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() -> Result<()> {
        let k = Keypad::new();
        assert!(!k.is_pressed(0xa));
        k.press(0xa)?;
        assert!(k.is_pressed(0xa));
        assert!(!k.is_pressed(0xb));
        k.release(0xa)?;
        assert!(!k.is_pressed(0xa));
        Ok(())
    }

    #[test]
    fn test_out_of_range() {
        let k = Keypad::new();
        assert!(k.press(16).is_err());
        assert!(k.release(200).is_err());
        assert!(!k.is_pressed(16));
    }

    #[test]
    fn test_first_pressed_lowest_wins() -> Result<()> {
        let k = Keypad::new();
        assert_eq!(k.first_pressed(15), None);
        k.press(9)?;
        k.press(3)?;
        assert_eq!(k.first_pressed(15), Some(3));
        k.release(3)?;
        assert_eq!(k.first_pressed(15), Some(9));
        Ok(())
    }

    #[test]
    fn test_first_pressed_respects_limit() -> Result<()> {
        let k = Keypad::new();
        k.press(0xf)?;
        assert_eq!(k.first_pressed(15), None);
        assert_eq!(k.first_pressed(16), Some(0xf));
        Ok(())
    }

    #[test]
    fn test_release_all() -> Result<()> {
        let k = Keypad::new();
        k.press(1)?;
        k.press(2)?;
        k.release_all();
        assert_eq!(k.first_pressed(16), None);
        Ok(())
    }
}
