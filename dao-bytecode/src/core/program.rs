//! Packed nybble program container
//!
//! A Dao program is a flat sequence of 4-bit opcodes stored two per byte,
//! high nybble first. This is also the exact layout of a compiled `.wuwei`
//! file: there is no header.

use crate::core::opcodes::Opcode;
use crate::error::{BytecodeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    bytes: Vec<u8>,
    nybbles: usize,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a program from a packed buffer holding `bit_len` meaningful bits.
    /// A trailing partial nybble counts as a whole one.
    pub fn from_packed(bytes: Vec<u8>, bit_len: usize) -> Result<Self> {
        let available = bytes.len() * 8;
        if bit_len > available {
            return Err(BytecodeError::BitLengthOutOfRange { bit_len, available });
        }
        let nybbles = bit_len.div_ceil(4);
        let mut bytes = bytes;
        bytes.truncate(nybbles.div_ceil(2));
        Ok(Self { bytes, nybbles })
    }

    /// Interpret every byte of a compiled `.wuwei` image as two opcodes.
    pub fn from_compiled(bytes: Vec<u8>) -> Self {
        let nybbles = bytes.len() * 2;
        Self { bytes, nybbles }
    }

    pub fn push(&mut self, op: Opcode) {
        let nybble = op.nybble();
        if self.nybbles % 2 == 0 {
            self.bytes.push(nybble << 4);
        } else if let Some(last) = self.bytes.last_mut() {
            *last |= nybble;
        }
        self.nybbles += 1;
    }

    /// Number of nybbles (instructions)
    pub fn len(&self) -> usize {
        self.nybbles
    }

    pub fn is_empty(&self) -> bool {
        self.nybbles == 0
    }

    pub fn bit_len(&self) -> usize {
        self.nybbles * 4
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn get(&self, index: usize) -> Option<Opcode> {
        if index >= self.nybbles {
            return None;
        }
        let byte = self.bytes[index / 2];
        let nybble = if index % 2 == 0 { byte >> 4 } else { byte & 0xF };
        Some(Opcode::from_low_bits(nybble as u32))
    }

    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        (0..self.nybbles).filter_map(move |i| self.get(i))
    }
}

impl FromIterator<Opcode> for Program {
    fn from_iter<I: IntoIterator<Item = Opcode>>(iter: I) -> Self {
        let mut program = Program::new();
        for op in iter {
            program.push(op);
        }
        program
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program({} nybbles: ", self.nybbles)?;
        for op in self.opcodes() {
            write!(f, "{}", op.symbol())?;
        }
        write!(f, ")")
    }
}
