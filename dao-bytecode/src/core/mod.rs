pub mod opcodes;
pub mod program;

// Re-export core types
pub use self::opcodes::{Opcode, SYMBOLS};
pub use self::program::Program;
