use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::{debug, warn};

use crate::config::Speed;
use crate::keypad::{Keypad, KEY_COUNT};

/// map of keys on the left-hand side of a qwerty keyboard to the COSMAC
/// hex keypad, which is laid out
///   1 2 3 C
///   4 5 6 D
///   7 8 9 E
///   A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals don't report key releases, so a key counts as held for this
/// long after its last press or auto-repeat
const KEY_HOLD: Duration = Duration::from_millis(150);

/// things the user asks of the emulator rather than the chip8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    Speed(Speed),
}

/// feeds terminal key events into the keypad
pub struct TermInput {
    keymap: HashMap<char, u8>,
    held: [Option<Instant>; KEY_COUNT],
    hold: Duration,
}

impl Default for TermInput {
    fn default() -> Self {
        Self::new()
    }
}

impl TermInput {
    pub fn new() -> Self {
        TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            held: [None; KEY_COUNT],
            hold: KEY_HOLD,
        }
    }

    /// deal with one event; chip8 keys go straight to the keypad, anything
    /// for the emulator itself is handed back
    pub fn handle_event(&mut self, event: Event, keypad: &Keypad, now: Instant) -> Option<Command> {
        let code = match event {
            Event::Key(evt) => evt.code,
            _ => return None,
        };
        match code {
            KeyCode::Esc => Some(Command::Quit),
            KeyCode::Char('p') => Some(Command::TogglePause),
            KeyCode::F(5) => Some(Command::Speed(Speed::Slow)),
            KeyCode::F(6) => Some(Command::Speed(Speed::Normal)),
            KeyCode::F(7) => Some(Command::Speed(Speed::Fast)),
            KeyCode::Char(c) => {
                match self.keymap.get(&c.to_ascii_lowercase()) {
                    Some(&key) => {
                        if let Err(e) = keypad.press(key) {
                            warn!("{}", e);
                        }
                        self.held[key as usize] = Some(now);
                    }
                    None => debug!("can't map {:?} to a COSMAC key", c),
                }
                None
            }
            _ => None,
        }
    }

    /// let go of keys that haven't been seen for a while
    pub fn release_expired(&mut self, keypad: &Keypad, now: Instant) {
        for (key, held) in self.held.iter_mut().enumerate() {
            if let Some(since) = *held {
                if now.duration_since(since) >= self.hold {
                    if let Err(e) = keypad.release(key as u8) {
                        warn!("{}", e);
                    }
                    *held = None;
                }
            }
        }
    }

    /// drain whatever the terminal has for us without blocking
    pub fn poll(&mut self, keypad: &Keypad) -> io::Result<Vec<Command>> {
        let mut commands = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Some(cmd) = self.handle_event(read()?, keypad, Instant::now()) {
                commands.push(cmd);
            }
        }
        self.release_expired(keypad, Instant::now());
        Ok(commands)
    }
}

/// raw mode on an alternate screen for as long as this lives
pub struct RawTerminal;

impl RawTerminal {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(RawTerminal)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
