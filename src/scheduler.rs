//! Drives the interpreter at a fixed interval from a ticker thread.
//!
//! ```text
//!   Idle --load--> Running --pause--> Paused --resume--> Running
//!     ^               |                  |
//!     +----reset------+------reset-------+
//! ```
//!
//! `load` is legal from any state and always ends up Running.
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::{EmulatorConfig, TimerMode, TIMER_PERIOD};
use crate::error::{Chip8Error, Result};
use crate::framebuffer::SharedFramebuffer;
use crate::interpreter::Chip8Interpreter;
use crate::keypad::SharedKeypad;
use crate::sound::{Mute, Sound, ToneChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// no program loaded
    Idle,
    Running,
    /// state retained, no ticks
    Paused,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => write!(f, "idle"),
            State::Running => write!(f, "running"),
            State::Paused => write!(f, "paused"),
        }
    }
}

type SharedSound = Arc<Mutex<Box<dyn Sound + Send>>>;

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// the running ticker thread and the means to stop it
struct Ticker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn start(
        interpreter: Arc<Mutex<Chip8Interpreter>>,
        sound: SharedSound,
        speed: Duration,
        timer_mode: TimerMode,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let halt = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("chip8-ticker".into())
            .spawn(move || {
                let mut next = Instant::now() + speed;
                let mut timers_due = Instant::now() + TIMER_PERIOD;
                while !halt.load(Ordering::SeqCst) {
                    let tone = {
                        let mut interp = lock(&interpreter);
                        match timer_mode {
                            TimerMode::PerTick => interp.tick(),
                            TimerMode::Fixed60Hz => {
                                let now = Instant::now();
                                let mut decayed = None;
                                while timers_due <= now {
                                    decayed = interp.decay_timers().or(decayed);
                                    timers_due += TIMER_PERIOD;
                                }
                                interp.cycle().or(decayed)
                            }
                        }
                    };
                    if let Some(tone) = tone {
                        tone.apply(&mut **lock(&sound));
                    }

                    // pace against absolute deadlines; if we've fallen
                    // behind, start counting again from now
                    let now = Instant::now();
                    if next > now {
                        spin_sleep::sleep(next - now);
                    } else {
                        next = now;
                    }
                    next += speed;
                }
            })?;
        Ok(Ticker { stop, handle })
    }

    /// returns once no tick is in flight
    fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            warn!("ticker thread panicked");
        }
    }
}

pub struct Scheduler {
    interpreter: Arc<Mutex<Chip8Interpreter>>,
    framebuffer: SharedFramebuffer,
    keypad: SharedKeypad,
    sound: SharedSound,
    state: State,
    speed: Duration,
    /// what `load` goes back to
    configured_speed: Duration,
    timer_mode: TimerMode,
    ticker: Option<Ticker>,
}

impl Scheduler {
    pub fn new(config: &EmulatorConfig) -> Self {
        let interpreter = Chip8Interpreter::new(config.seed);
        let framebuffer = interpreter.framebuffer();
        let keypad = interpreter.keypad();
        let sound: Box<dyn Sound + Send> = Box::new(Mute::new());
        Scheduler {
            interpreter: Arc::new(Mutex::new(interpreter)),
            framebuffer,
            keypad,
            sound: Arc::new(Mutex::new(sound)),
            state: State::Idle,
            speed: config.speed,
            configured_speed: config.speed,
            timer_mode: config.timer_mode,
            ticker: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn speed(&self) -> Duration {
        self.speed
    }

    pub fn timer_mode(&self) -> TimerMode {
        self.timer_mode
    }

    /// handle for the renderer
    pub fn framebuffer(&self) -> SharedFramebuffer {
        SharedFramebuffer::clone(&self.framebuffer)
    }

    /// handle for the host input
    pub fn keypad(&self) -> SharedKeypad {
        SharedKeypad::clone(&self.keypad)
    }

    /// where tone start/stop signals go; silent unless set
    pub fn set_sound(&mut self, sound: Box<dyn Sound + Send>) {
        *lock(&self.sound) = sound;
    }

    /// look at the machine between ticks
    pub fn with_interpreter<R>(&self, f: impl FnOnce(&Chip8Interpreter) -> R) -> R {
        let interp = lock(&self.interpreter);
        f(&*interp)
    }

    fn start_ticker(&mut self) -> Result<()> {
        let ticker = Ticker::start(
            Arc::clone(&self.interpreter),
            Arc::clone(&self.sound),
            self.speed,
            self.timer_mode,
        )?;
        self.ticker = Some(ticker);
        Ok(())
    }

    fn halt(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    fn silence(&self) {
        ToneChange::Stop.apply(&mut **lock(&self.sound));
    }

    /// reset everything, including the speed, load the program and start
    /// running it. If the program is rejected the machine carries on as it
    /// was.
    pub fn load(&mut self, rom: &[u8]) -> Result<()> {
        let was = self.state;
        self.halt();
        let loaded = lock(&self.interpreter).load_program(rom);
        if let Err(e) = loaded {
            if was == State::Running {
                self.start_ticker()?;
            }
            return Err(e);
        }
        self.silence();
        self.speed = self.configured_speed;
        self.start_ticker()?;
        self.state = State::Running;
        info!("running at one tick per {:?}, {} timers", self.speed, self.timer_mode);
        Ok(())
    }

    /// load a program from a file or whatever
    pub fn load_from(&mut self, reader: &mut impl io::Read) -> Result<()> {
        let mut rom = Vec::new();
        reader.read_to_end(&mut rom)?;
        self.load(&rom)
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != State::Running {
            return Err(Chip8Error::InvalidTransition {
                state: self.state,
                action: "pause",
            });
        }
        self.halt();
        self.state = State::Paused;
        info!("paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != State::Paused {
            return Err(Chip8Error::InvalidTransition {
                state: self.state,
                action: "resume",
            });
        }
        self.start_ticker()?;
        self.state = State::Running;
        info!("resumed at one tick per {:?}", self.speed);
        Ok(())
    }

    /// applies from the next time the ticker (re)starts
    pub fn set_speed(&mut self, speed: Duration) {
        debug!("speed {:?} -> {:?}", self.speed, speed);
        self.speed = speed;
    }

    /// run exactly one tick by hand
    pub fn step(&mut self) -> Result<()> {
        if self.state != State::Paused {
            return Err(Chip8Error::InvalidTransition {
                state: self.state,
                action: "step",
            });
        }
        let tone = lock(&self.interpreter).tick();
        if let Some(tone) = tone {
            tone.apply(&mut **lock(&self.sound));
        }
        Ok(())
    }

    /// stop and forget the program
    pub fn reset(&mut self) {
        self.halt();
        lock(&self.interpreter).reset();
        self.silence();
        self.state = State::Idle;
        info!("reset");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.halt();
    }
}
