//! Opcode definitions for Dao programs

use crate::error::{BytecodeError, Result};
use serde::{Deserialize, Serialize};

/// The sixteen Dao instructions, one per nybble value (4 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[allow(non_camel_case_types)] // Opcodes follow the five-letter mnemonic convention
pub enum Opcode {
    IDLES = 0x0,
    SWAPS = 0x1,
    LATER = 0x2,
    MERGE = 0x3,
    SIFTS = 0x4,
    EXECS = 0x5,
    DELEV = 0x6,
    EQUAL = 0x7,
    HALVE = 0x8,
    UPLEV = 0x9,
    READS = 0xA,
    DEALC = 0xB,
    SPLIT = 0xC,
    POLAR = 0xD,
    DOALC = 0xE,
    INPUT = 0xF,
}

/// Canonical symbol for every nybble value, indexed by the value itself.
pub const SYMBOLS: [char; 16] = [
    '.', '!', '/', ')', '%', '#', '>', '=', '(', '<', ':', 'S', '[', '*', '$', ';',
];

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::IDLES,
        Opcode::SWAPS,
        Opcode::LATER,
        Opcode::MERGE,
        Opcode::SIFTS,
        Opcode::EXECS,
        Opcode::DELEV,
        Opcode::EQUAL,
        Opcode::HALVE,
        Opcode::UPLEV,
        Opcode::READS,
        Opcode::DEALC,
        Opcode::SPLIT,
        Opcode::POLAR,
        Opcode::DOALC,
        Opcode::INPUT,
    ];

    /// Parse opcode from a nybble (only the low four bits may be set)
    pub fn from_nybble(nybble: u8) -> Result<Self> {
        if nybble > 0xF {
            return Err(BytecodeError::InvalidNybble(nybble));
        }
        Ok(Self::ALL[nybble as usize])
    }

    /// Decode the low four bits of any value; never fails.
    pub fn from_low_bits(value: u32) -> Self {
        Self::ALL[(value & 0xF) as usize]
    }

    pub fn nybble(self) -> u8 {
        self as u8
    }

    /// Symbol used in `.dao` source for this opcode
    pub fn symbol(self) -> char {
        SYMBOLS[self as usize]
    }

    /// Map a source symbol to its opcode. `]` is an alias of `)`.
    pub fn from_symbol(ch: char) -> Option<Self> {
        let op = match ch {
            '.' => Opcode::IDLES,
            '!' => Opcode::SWAPS,
            '/' => Opcode::LATER,
            ')' | ']' => Opcode::MERGE,
            '%' => Opcode::SIFTS,
            '#' => Opcode::EXECS,
            '>' => Opcode::DELEV,
            '=' => Opcode::EQUAL,
            '(' => Opcode::HALVE,
            '<' => Opcode::UPLEV,
            ':' => Opcode::READS,
            'S' => Opcode::DEALC,
            '[' => Opcode::SPLIT,
            '*' => Opcode::POLAR,
            '$' => Opcode::DOALC,
            ';' => Opcode::INPUT,
            _ => return None,
        };
        Some(op)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::IDLES => "IDLES",
            Opcode::SWAPS => "SWAPS",
            Opcode::LATER => "LATER",
            Opcode::MERGE => "MERGE",
            Opcode::SIFTS => "SIFTS",
            Opcode::EXECS => "EXECS",
            Opcode::DELEV => "DELEV",
            Opcode::EQUAL => "EQUAL",
            Opcode::HALVE => "HALVE",
            Opcode::UPLEV => "UPLEV",
            Opcode::READS => "READS",
            Opcode::DEALC => "DEALC",
            Opcode::SPLIT => "SPLIT",
            Opcode::POLAR => "POLAR",
            Opcode::DOALC => "DOALC",
            Opcode::INPUT => "INPUT",
        }
    }

    /// Check if this opcode moves the running instruction pointer
    pub fn is_control_flow(self) -> bool {
        matches!(
            self,
            Opcode::EXECS | Opcode::EQUAL | Opcode::POLAR | Opcode::UPLEV | Opcode::DEALC
        )
    }

    /// Check if this opcode changes which floor is written
    pub fn is_floor_move(self) -> bool {
        matches!(
            self,
            Opcode::MERGE | Opcode::HALVE | Opcode::SPLIT | Opcode::LATER | Opcode::DOALC
        )
    }

    /// Check if this opcode performs I/O
    pub fn is_io(self) -> bool {
        matches!(self, Opcode::READS | Opcode::INPUT)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
