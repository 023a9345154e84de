use std::{error, fmt};

// Faults raised by the interpreter core. Everything except UnknownOpcode
// ends the run; unknown opcodes are skipped so a malformed ROM can still
// be diagnosed from the debug log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Error {
    // ROM blob does not fit in RAM above 0x200
    RomTooLarge(usize),
    // Unrecognized instruction word, with the PC it was fetched from
    UnknownOpcode { op: u16, pc: u16 },
    // CALL with all 16 stack slots in use
    StackOverflow { pc: u16 },
    // RET with an empty stack
    StackUnderflow { pc: u16 },
    // Memory access past 0xFFF
    BadAddress(u16),
}

impl Chip8Error {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Chip8Error::UnknownOpcode { .. })
    }
}

impl fmt::Display for Chip8Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Chip8Error::RomTooLarge(size) => {
                write!(f, "ROM is {} bytes, larger than the {} available", size, 4096 - 0x200)
            }
            Chip8Error::UnknownOpcode { op, pc } => {
                write!(f, "invalid opcode {:#06X} at {:#05X}", op, pc)
            }
            Chip8Error::StackOverflow { pc } => {
                write!(f, "call stack overflow at {:#05X}", pc)
            }
            Chip8Error::StackUnderflow { pc } => {
                write!(f, "return with empty call stack at {:#05X}", pc)
            }
            Chip8Error::BadAddress(addr) => {
                write!(f, "memory access out of bounds: {:#06X}", addr)
            }
        }
    }
}

impl error::Error for Chip8Error {}
