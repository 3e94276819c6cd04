// Floors Example
// Runs a small program that reads a byte into a child floor, executes that
// byte as a nested program, and prints it back.

use anyhow::Result;
use dao_bytecode::{disasm, encode};
use dao_vm::api::{BufferedInput, Machine};
use dao_vm::state::serialize_state_to_pretty_json;
use dao_vm::EngineConfig;

fn main() -> Result<()> {
    println!("Dao Floors Example");
    println!("------------------");

    let program = encode("$$$ ; # :");
    println!("Program:\n{}\n", disasm::disassemble(&program));

    let mut machine = Machine::new(EngineConfig::default());
    machine.set_input(BufferedInput::from("k"));
    machine.load(&program);
    machine.run()?;

    println!("Output: {:?}", String::from_utf8_lossy(machine.output()));
    println!("Steps: {}", machine.steps());
    println!("Final state:\n{}", serialize_state_to_pretty_json(&machine)?);
    Ok(())
}
