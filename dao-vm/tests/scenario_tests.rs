
use dao_vm::api::{Opcode, Selection};
use pretty_assertions::assert_eq;
use test_utils::{machine_with_child, set_memory};

#[test]
fn test_swaps_on_one_bit_memory_is_noop() {
    let (mut machine, _root, child) = machine_with_child("!");
    machine.path_mut(child).memory.write(0, 1, 1);
    let before = machine.path(child).clone();

    machine.dispatch(Opcode::SWAPS).unwrap();

    assert_eq!(machine.path(child), &before);
}

#[test]
fn test_two_doalc_grow_a_word_to_four_words() {
    let (mut machine, root, _child) = machine_with_child("$$");
    machine.set_written(root);
    assert_eq!(machine.path(root).capacity_bits(), 32);

    machine.dispatch(Opcode::DOALC).unwrap();
    assert_eq!(machine.path(root).capacity_bits(), 64);
    assert_eq!(machine.path(root).selection, Selection::new(0, 64));

    machine.dispatch(Opcode::DOALC).unwrap();
    assert_eq!(machine.path(root).capacity_bits(), 128);
    assert_eq!(machine.path(root).selection, Selection::new(0, 128));
    assert_eq!(machine.path(root).memory.words()[0], 0xEE00_0000);
    assert_eq!(&machine.path(root).memory.words()[1..], &[0, 0, 0]);
}

#[test]
fn test_repeated_dealc_without_owner_stops_loop() {
    let (mut machine, root, _child) = machine_with_child("SSSSSS");
    machine.set_written(root);
    let program_word = machine.path(root).memory.words()[0];

    for expected in [16, 8, 4, 2, 1] {
        machine.dispatch(Opcode::DEALC).unwrap();
        let path = machine.path(root);
        assert_eq!(path.capacity_bits(), expected);
        assert_eq!(path.selection, Selection::new(0, expected));
        assert!(machine.is_looping());
    }
    assert_eq!(
        machine.path(root).memory.read(0, 1),
        program_word >> 31,
        "shrinking keeps the leading bit"
    );

    machine.dispatch(Opcode::DEALC).unwrap();
    assert!(!machine.is_looping());
    let path = machine.path(root);
    assert_eq!(path.capacity_bits(), 1);
    assert_eq!(path.memory.words(), &[0]);
}

#[test]
fn test_nested_execs_restores_running_and_written() {
    let (mut machine, root, child) = machine_with_child("#");
    // four zero bits: the inner program is a single IDLE
    set_memory(&mut machine, child, 4, &[0]);

    machine.dispatch(Opcode::EXECS).unwrap();

    assert_eq!(machine.running(), Some(root));
    assert_eq!(machine.written(), Some(child));
    assert!(machine.is_looping());
    assert_eq!(machine.steps(), 1);
    let grandchild = machine.path(child).child.expect("grandchild kept for reuse");
    assert_eq!(machine.path(grandchild).floor, 2);
}

#[test]
fn test_equal_skips_when_ends_differ() {
    let (mut machine, root, child) = machine_with_child("=...");
    set_memory(&mut machine, child, 2, &[0x8000_0000]);
    machine.path_mut(root).ip = 0;

    machine.dispatch(Opcode::EQUAL).unwrap();
    assert_eq!(machine.path(root).ip, 1);

    set_memory(&mut machine, child, 2, &[0xC000_0000]);
    machine.dispatch(Opcode::EQUAL).unwrap();
    assert_eq!(machine.path(root).ip, 1);
}
