use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dao_bytecode::{disasm, encode};
use dao_vm::api::BufferedInput;
use dao_vm::state::serialize_state_to_pretty_json;
use dao_vm::{EngineConfig, Machine};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::task;
use tracing::debug;

/// Represents an error that occurred during interpretation
#[derive(Debug, Clone)]
pub struct InterpreterError {
    /// A human-readable error message
    pub message: String,
    /// Whatever the program printed before it failed
    pub output: Option<String>,
}

impl InterpreterError {
    /// Create an error for a run that stopped with an engine fault
    pub fn execution_error(message: impl Into<String>, output: Option<String>) -> Self {
        InterpreterError {
            message: message.into(),
            output,
        }
    }

    /// Create a new other error
    pub fn other_error(message: impl Into<String>) -> Self {
        InterpreterError {
            message: message.into(),
            output: None,
        }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(output) = self.output.as_deref().filter(|o| !o.is_empty()) {
            write!(f, "\nOutput before failure: {}", output)?;
        }

        Ok(())
    }
}

/// Represents the result of an interpretation operation
#[derive(Debug, Clone)]
pub enum InterpretationResult {
    /// Successful run with everything the program printed
    Success(String),
    /// Error during interpretation
    Error(InterpreterError),
}

impl InterpretationResult {
    /// Returns true if the result is a success
    pub fn is_success(&self) -> bool {
        matches!(self, InterpretationResult::Success(_))
    }

    /// Returns true if the result is an error
    pub fn is_error(&self) -> bool {
        matches!(self, InterpretationResult::Error(_))
    }

    /// Unwraps the success value, panics if the result is an error
    pub fn unwrap(self) -> String {
        match self {
            InterpretationResult::Success(value) => value,
            InterpretationResult::Error(err) => panic!("Called unwrap on an error result: {}", err),
        }
    }

    /// Unwraps the error value, panics if the result is a success
    pub fn unwrap_err(self) -> InterpreterError {
        match self {
            InterpretationResult::Success(_) => {
                panic!("Called unwrap_err on a success result")
            }
            InterpretationResult::Error(err) => err,
        }
    }
}

/// Trait for interpreter providers
/// This trait defines the interface for interpreters that can be used with daosh
#[async_trait]
pub trait InterpreterProvider {
    /// Run a program given as symbolic source and return its output
    async fn interpret(&self, code: &str) -> InterpretationResult;

    /// Disassemble the provided code into a nybble listing
    /// Default providers may return an error if unsupported
    fn disassemble(&self, _code: &str) -> Result<String> {
        Err(anyhow!("Disassembly is not supported by this provider"))
    }

    /// Queue input bytes for the next run
    fn set_input(&self, _input: &str) -> Result<()> {
        Err(anyhow!("Program input is not supported by this provider"))
    }

    /// JSON snapshot of the machine after the last run
    fn state(&self) -> Result<String> {
        Err(anyhow!("Machine state is not available from this provider"))
    }

    /// Root floor memory after the last run
    fn memory(&self) -> Result<String> {
        Err(anyhow!("Memory dumps are not available from this provider"))
    }
}

/// A fake interpreter provider that simply returns the input code
/// This is used for testing and as a placeholder
pub struct FakeInterpreterProvider;

#[async_trait]
impl InterpreterProvider for FakeInterpreterProvider {
    async fn interpret(&self, code: &str) -> InterpretationResult {
        InterpretationResult::Success(code.to_string())
    }
}

/// What one blocking run leaves behind
struct RunReport {
    output: String,
    state: Option<String>,
    memory: Option<String>,
    error: Option<String>,
}

fn run_program(code: &str, config: EngineConfig, input: Option<String>) -> RunReport {
    let program = encode(code);
    let mut machine = Machine::new(config);
    if let Some(input) = input {
        machine.set_input(BufferedInput::new(input));
    }
    machine.load(&program);
    let error = machine.run().err().map(|e| e.to_string());

    let state = serialize_state_to_pretty_json(&machine).ok();
    let memory = machine
        .root()
        .map(|root| machine.path(root).memory.to_bit_string());
    debug!(steps = machine.steps(), failed = error.is_some(), "run finished");

    let output = String::from_utf8_lossy(&machine.into_output()).into_owned();
    RunReport {
        output,
        state,
        memory,
        error,
    }
}

/// Runs programs on the Dao engine
#[derive(Clone, Default)]
pub struct DaoInterpreterProvider {
    config: EngineConfig,
    /// Input consumed by the next run
    pending_input: Arc<Mutex<Option<String>>>,
    last_state: Arc<Mutex<Option<String>>>,
    last_memory: Arc<Mutex<Option<String>>>,
}

impl DaoInterpreterProvider {
    pub fn new(config: EngineConfig) -> Self {
        DaoInterpreterProvider {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn take_input(&self) -> Result<Option<String>> {
        let mut pending = self
            .pending_input
            .lock()
            .map_err(|e| anyhow!("Failed to lock pending input: {}", e))?;
        Ok(pending.take())
    }

    fn record(&self, report: &RunReport) -> Result<()> {
        *self
            .last_state
            .lock()
            .map_err(|e| anyhow!("Failed to lock last state: {}", e))? = report.state.clone();
        *self
            .last_memory
            .lock()
            .map_err(|e| anyhow!("Failed to lock last memory: {}", e))? = report.memory.clone();
        Ok(())
    }
}

#[async_trait]
impl InterpreterProvider for DaoInterpreterProvider {
    async fn interpret(&self, code: &str) -> InterpretationResult {
        let input = match self.take_input() {
            Ok(input) => input,
            Err(e) => return InterpretationResult::Error(InterpreterError::other_error(e.to_string())),
        };
        let code = code.to_string();
        let config = self.config.clone();

        // the engine recurses on EXECS, keep it off the async workers
        let report = match task::spawn_blocking(move || run_program(&code, config, input)).await {
            Ok(report) => report,
            Err(e) => {
                return InterpretationResult::Error(InterpreterError::other_error(format!(
                    "Blocking task error: {}",
                    e
                )))
            }
        };

        if let Err(e) = self.record(&report) {
            return InterpretationResult::Error(InterpreterError::other_error(e.to_string()));
        }

        match report.error {
            Some(message) => InterpretationResult::Error(InterpreterError::execution_error(
                message,
                Some(report.output),
            )),
            None => InterpretationResult::Success(report.output),
        }
    }

    fn disassemble(&self, code: &str) -> Result<String> {
        let program = encode(code);
        if program.is_empty() {
            return Ok("No code to disassemble (empty program)".to_string());
        }
        Ok(disasm::disassemble(&program))
    }

    fn set_input(&self, input: &str) -> Result<()> {
        let mut pending = self
            .pending_input
            .lock()
            .map_err(|e| anyhow!("Failed to lock pending input: {}", e))?;
        *pending = Some(input.to_string());
        Ok(())
    }

    fn state(&self) -> Result<String> {
        self.last_state
            .lock()
            .map_err(|e| anyhow!("Failed to lock last state: {}", e))?
            .clone()
            .ok_or_else(|| anyhow!("No program has run yet"))
    }

    fn memory(&self) -> Result<String> {
        self.last_memory
            .lock()
            .map_err(|e| anyhow!("Failed to lock last memory: {}", e))?
            .clone()
            .ok_or_else(|| anyhow!("No program has run yet"))
    }
}
