use dao_bytecode::encode;
use dao_vm::api::{BufferedInput, Machine};
use dao_vm::EngineConfig;

fn main() {
    divan::main();
}

const PROGRAMS: &[(&str, &str)] = &[
    ("echo_byte", "$$$;:"),
    ("grow_and_split", "$$$$$$[[[[((((!!!!"),
    ("nested_report", "$$$;#:"),
    ("level_restarts", "<<<<<<<<>"),
];

#[divan::bench(args = PROGRAMS.iter().map(|(name, _)| *name))]
fn run_program(bencher: divan::Bencher, name: &str) {
    let source = PROGRAMS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, s)| *s)
        .expect("known program");
    let program = encode(source);

    bencher.bench_local(|| {
        let mut machine = Machine::new(EngineConfig::default());
        machine.set_input(BufferedInput::from("k"));
        machine.load(&program);
        machine.run().expect("program runs");
        divan::black_box_drop(machine);
    });
}

#[divan::bench(args = [6, 10, 14])]
fn sifts_wide_memory(bencher: divan::Bencher, grows: usize) {
    let source = format!("{}%", "$".repeat(grows));
    let program = encode(&source);
    let config = EngineConfig {
        max_capacity_bits: 1 << 20,
        ..EngineConfig::default()
    };

    bencher.bench_local(|| {
        let mut machine = Machine::new(config.clone());
        machine.load(&program);
        machine.run().expect("program runs");
        divan::black_box_drop(machine);
    });
}
