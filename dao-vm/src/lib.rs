// Execution engine for the Dao nybble machine.
// The crate is split into memory, selection, path (floors), vm (machine
// state), execute (the loop) and opcode_exec (the dispatcher).

pub mod config;
mod error;
mod execute;
pub mod io;
pub mod memory;
mod opcode_exec;
pub mod path;
pub mod selection;
pub mod state;
mod vm;

pub use crate::config::{EngineConfig, PrivilegeCeilings};
pub use crate::error::{ExecError, Result};
pub use crate::vm::Machine;

// Re-export a lightweight API for users
pub mod api {
    pub use crate::config::{EngineConfig, PrivilegeCeilings};
    pub use crate::io::{BufferedInput, ByteSource, EmptyInput, ReaderInput};
    pub use crate::memory::{BitMemory, WORD_BITS};
    pub use crate::path::{Path, PathId};
    pub use crate::selection::Selection;
    pub use crate::vm::Machine;
    pub use dao_bytecode::{Opcode, Program};
}
