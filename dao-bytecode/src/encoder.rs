//! Symbolic source encoder
//!
//! Translates `.dao` source (one printable symbol per opcode) into a packed
//! [`Program`]. Tabs, spaces and line breaks are ignored and `@` starts a
//! comment that runs to the end of the line.

use std::io::Write;

use tracing::{debug, trace};

use crate::COMMENT_DELIMITER;
use crate::core::{Opcode, Program};
use crate::error::{BytecodeError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    strict: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject characters outside the symbol table instead of encoding them as IDLES.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn encode(&self, source: &str) -> Result<Program> {
        let mut program = Program::new();
        let mut in_comment = false;
        let mut line = 1;
        let mut col = 0;

        for ch in source.chars() {
            col += 1;
            match ch {
                '\n' => {
                    in_comment = false;
                    line += 1;
                    col = 0;
                }
                '\r' => in_comment = false,
                ' ' | '\t' => {}
                COMMENT_DELIMITER => in_comment = true,
                _ if in_comment => {}
                _ => match Opcode::from_symbol(ch) {
                    Some(op) => program.push(op),
                    None if self.strict => {
                        return Err(BytecodeError::UnknownSymbol { ch, line, col });
                    }
                    None => {
                        trace!(?ch, line, col, "unknown symbol encoded as IDLES");
                        program.push(Opcode::IDLES);
                    }
                },
            }
        }

        debug!(nybbles = program.len(), "encoded symbolic source");
        Ok(program)
    }

    /// Encode `source` and write the packed bytes (a `.wuwei` image).
    pub fn compile<W: Write>(&self, source: &str, out: &mut W) -> Result<Program> {
        let program = self.encode(source)?;
        out.write_all(program.as_bytes())?;
        Ok(program)
    }
}

/// Lenient encoding: unknown symbols become IDLES, so this never fails.
pub fn encode(source: &str) -> Program {
    Encoder::new().encode(source).unwrap_or_default()
}

/// Split an inline program of the form `code@input` into its two parts.
pub fn split_inline_input(text: &str) -> (&str, Option<&str>) {
    match text.split_once(COMMENT_DELIMITER) {
        Some((code, input)) => (code, Some(input)),
        None => (text, None),
    }
}
