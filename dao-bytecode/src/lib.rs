//! Dao Bytecode
//!
//! The instruction layer of the Dao machine: the sixteen nybble opcodes,
//! the symbolic source encoder, the packed program container and a
//! disassembler.

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod core;
pub mod disasm;
pub mod encoder;
pub mod error;

// Re-export commonly used types
pub use crate::core::{Opcode, Program, SYMBOLS};
pub use crate::encoder::{Encoder, encode, split_inline_input};
pub use crate::error::{BytecodeError, Result};

/// Extension of symbolic source files
pub const FILE_SYMBOLIC: &str = "dao";

/// Extension of compiled (packed nybble) files
pub const FILE_COMPILED: &str = "wuwei";

/// Starts a comment running to the end of the line; in inline programs it
/// separates the program from its input.
pub const COMMENT_DELIMITER: char = '@';
