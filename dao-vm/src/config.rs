//! Engine configuration.
//!
//! Every field has a default, so a JSON config file only needs to name the
//! values it overrides.

use serde::{Deserialize, Serialize};

/// Allocation ceiling in bits.
pub const DEFAULT_MAX_CAPACITY_BITS: usize = 1 << 17;

/// Deepest floor a program may reach through nested EXECS.
pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// Per-opcode privilege ceilings. An opcode is skipped while the running
/// floor's level is at or above its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeCeilings {
    pub swaps: u8,
    /// Level from which LATER always advances instead of merging.
    pub later: u8,
    pub merge: u8,
    pub sifts: u8,
    pub execs: u8,
    pub equal: u8,
    pub halve: u8,
    pub uplev: u8,
    pub reads: u8,
    pub dealc: u8,
    /// Ceiling of SPLIT's polarizing body; the trailing halve is gated separately.
    pub split: u8,
    pub polar: u8,
    pub doalc: u8,
    pub input: u8,
}

impl Default for PrivilegeCeilings {
    fn default() -> Self {
        Self {
            swaps: 1,
            later: 4,
            merge: 7,
            sifts: 5,
            execs: 8,
            equal: 5,
            halve: 7,
            uplev: 9,
            reads: 6,
            dealc: 2,
            split: 1,
            polar: 3,
            doalc: 1,
            input: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// DOALC refuses to grow a floor that already holds this many bits.
    pub max_capacity_bits: usize,
    /// Turn an exhausted allocation into a silent no-op instead of an error.
    pub ignore_overflow: bool,
    pub max_depth: usize,
    /// Instruction budget for a whole run. `None` runs until the program halts.
    pub max_steps: Option<u64>,
    /// Leave memory contents out of per-step trace events.
    pub hide_data: bool,
    pub ceilings: PrivilegeCeilings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_capacity_bits: DEFAULT_MAX_CAPACITY_BITS,
            ignore_overflow: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: None,
            hide_data: false,
            ceilings: PrivilegeCeilings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
