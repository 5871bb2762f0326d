use std::io;

use thiserror::Error;

use crate::scheduler::State;

/// Everything that can go wrong inside the machine. Faults raised while
/// executing an instruction are recovered by the interpreter; load-time
/// faults are handed back to the caller.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("invalid {kind} index {index}")]
    InvalidIndex { kind: &'static str, index: usize },

    #[error("memory access out of bounds at {addr:#06x}")]
    InvalidAddress { addr: usize },

    #[error("ROM is too large ({size} bytes), at most {max} bytes fit")]
    OutOfSpace { size: usize, max: usize },

    #[error("call stack overflow (depth {depth})")]
    StackOverflow { depth: usize },

    #[error("return with empty call stack")]
    StackUnderflow,

    #[error("cannot {action} while {state}")]
    InvalidTransition { state: State, action: &'static str },

    #[error("failed to read ROM")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
