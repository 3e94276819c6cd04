use dao_bytecode::BytecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("program exceeded maximum memory: floor {floor} cannot grow past {max_bits} bits")]
    CapacityExceeded { floor: usize, max_bits: usize },

    #[error("nesting depth exceeded the limit of {limit} floors")]
    DepthExceeded { limit: usize },

    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },

    #[error("failed to write program output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Bytecode(#[from] BytecodeError),
}

pub type Result<T> = std::result::Result<T, ExecError>;
