//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * one instruction per scheduler tick; the tick interval is the "speed"
//! * timers count down once per tick by default, or at a true 60Hz
//! * decode and execute are separate steps, so each can be tested alone
//! * display and input are shared with host threads; the interpreter never
//!   needs to know how either works
//! * no process-wide state: every machine is an explicitly built `Scheduler`
//!   (or bare `Chip8Interpreter`), so several can run side by side
//!
//! Model
//!
//! Scheduler
//!  |-- config (speed, timer mode, RNG seed)
//!  |-- sound (tone start/stop signals only)
//!  `-- ticker thread
//!       `-- interpreter
//!            |-- registers, memory (owned)
//!            |-- framebuffer (shared with the renderer)
//!            `-- keypad (shared with host input)
//!
//! Each tick:
//!
//!  * DT and ST count down if non-zero
//!  * the word at PC is fetched and decoded to an `Instruction`
//!  * the instruction runs; faults are logged and the tick becomes a no-op
pub mod config;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod sound;

pub use config::{EmulatorConfig, Speed, TimerMode};
pub use error::{Chip8Error, Result};
pub use interpreter::Chip8Interpreter;
pub use scheduler::{Scheduler, State};
