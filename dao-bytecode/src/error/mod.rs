//! Error types for encoding and decoding Dao programs

use thiserror::Error;

/// Main error type for bytecode operations
#[derive(Error, Debug)]
pub enum BytecodeError {
    #[error("Invalid nybble: {0:#04x}")]
    InvalidNybble(u8),

    #[error("Unknown symbol {ch:?} at {line}:{col}")]
    UnknownSymbol { ch: char, line: usize, col: usize },

    #[error("Bit length {bit_len} exceeds the {available} bits supplied")]
    BitLengthOutOfRange { bit_len: usize, available: usize },

    #[error("Program I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type
pub type Result<T> = std::result::Result<T, BytecodeError>;
