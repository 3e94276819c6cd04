
use dao_vm::api::{BitMemory, Opcode, Selection};
use dao_vm::{EngineConfig, ExecError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use test_utils::{machine_with_child, run_with_config, set_memory};

#[test]
fn test_sifts_compacts_nonzero_nybbles() {
    let (mut machine, _root, child) = machine_with_child("%");
    set_memory(&mut machine, child, 32, &[0x0A0B_0C00]);

    machine.dispatch(Opcode::SIFTS).unwrap();
    assert_eq!(machine.path(child).memory.words(), &[0xABC0_0000]);
}

#[test]
fn test_sifts_starts_at_selection_index() {
    let (mut machine, _root, child) = machine_with_child("%");
    set_memory(&mut machine, child, 32, &[0x0A0B_0C00]);
    machine.path_mut(child).selection = Selection::new(8, 8);

    machine.dispatch(Opcode::SIFTS).unwrap();
    assert_eq!(machine.path(child).memory.words(), &[0x0ABC_0000]);
}

#[test]
fn test_split_polarizes_then_halves() {
    let (mut machine, _root, child) = machine_with_child("[");
    set_memory(&mut machine, child, 32, &[0x0F00_0000]);
    machine.path_mut(child).selection = Selection::new(0, 8);

    machine.dispatch(Opcode::SPLIT).unwrap();
    let path = machine.path(child);
    assert_eq!(path.memory.read(0, 8), 0xF0);
    assert_eq!(path.selection, Selection::new(0, 4));
}

#[test]
fn test_split_across_words() {
    let (mut machine, _root, child) = machine_with_child("[");
    machine.path_mut(child).memory = BitMemory::with_capacity(64);
    machine.path_mut(child).selection = Selection::whole(64);

    machine.dispatch(Opcode::SPLIT).unwrap();
    let path = machine.path(child);
    assert_eq!(path.memory.words(), &[u32::MAX, 0]);
    assert_eq!(path.selection, Selection::new(0, 32));
}

#[test]
fn test_split_on_single_bit_descends_into_child() {
    let (mut machine, root, child) = machine_with_child("[");
    machine.path_mut(root).selection = Selection::new(5, 1);
    machine.set_written(root);
    set_memory(&mut machine, child, 4, &[0]);

    machine.dispatch(Opcode::SPLIT).unwrap();
    assert_eq!(machine.written(), Some(child));
    let path = machine.path(child);
    assert_eq!(path.memory.read(0, 4), 0b1100);
    assert_eq!(path.selection, Selection::new(0, 1));
}

#[test]
fn test_split_body_is_gated_but_halve_still_runs() {
    let (mut machine, root, child) = machine_with_child("[");
    machine.path_mut(root).level = 1;
    set_memory(&mut machine, child, 8, &[0]);

    machine.dispatch(Opcode::SPLIT).unwrap();
    let path = machine.path(child);
    assert_eq!(path.memory.read(0, 8), 0);
    assert_eq!(path.selection, Selection::new(0, 4));
}

#[test]
fn test_halve_descends_at_one_bit() {
    let (mut machine, root, child) = machine_with_child("(");
    machine.path_mut(root).selection = Selection::new(7, 1);
    machine.set_written(root);
    set_memory(&mut machine, child, 2, &[0]);
    machine.path_mut(child).selection = Selection::new(1, 1);

    machine.dispatch(Opcode::HALVE).unwrap();
    assert_eq!(machine.written(), Some(child));
    assert_eq!(machine.path(child).selection, Selection::new(0, 2));
}

#[test]
fn test_merge_at_full_width_moves_up_to_owner() {
    let (mut machine, root, child) = machine_with_child(")");
    set_memory(&mut machine, child, 2, &[0]);

    machine.dispatch(Opcode::MERGE).unwrap();
    assert_eq!(machine.written(), Some(root));
    assert_eq!(machine.path(root).selection, Selection::new(1, 1));
}

#[test]
fn test_merge_into_one_bit_owner_selects_bit_zero() {
    let (mut machine, _root, child) = machine_with_child(")");
    let grandchild = machine.floors_mut().child_or_spawn(child);
    machine.set_written(grandchild);

    machine.dispatch(Opcode::MERGE).unwrap();
    assert_eq!(machine.written(), Some(child));
    assert_eq!(machine.path(child).selection, Selection::new(0, 1));
}

#[test]
fn test_merge_without_owner_is_noop() {
    let (mut machine, root, _child) = machine_with_child(")");
    machine.set_written(root);

    machine.dispatch(Opcode::MERGE).unwrap();
    assert_eq!(machine.written(), Some(root));
    assert_eq!(machine.path(root).selection, Selection::whole(32));
}

#[test]
fn test_later_advances_aligned_and_merges_unaligned() {
    let (mut machine, _root, child) = machine_with_child("/");
    set_memory(&mut machine, child, 8, &[0]);
    machine.path_mut(child).selection = Selection::new(0, 2);

    machine.dispatch(Opcode::LATER).unwrap();
    assert_eq!(machine.path(child).selection, Selection::new(2, 2));
    machine.dispatch(Opcode::LATER).unwrap();
    assert_eq!(machine.path(child).selection, Selection::new(0, 4));
}

#[test]
fn test_later_always_advances_at_high_level() {
    let (mut machine, root, child) = machine_with_child("/");
    machine.path_mut(root).level = 4;
    set_memory(&mut machine, child, 8, &[0]);
    machine.path_mut(child).selection = Selection::new(2, 2);

    machine.dispatch(Opcode::LATER).unwrap();
    assert_eq!(machine.path(child).selection, Selection::new(4, 2));
    machine.path_mut(child).selection = Selection::new(6, 2);
    machine.dispatch(Opcode::LATER).unwrap();
    assert_eq!(machine.path(child).selection, Selection::new(0, 2));
}

#[rstest]
#[case(0b10, false)]
#[case(0b11, true)]
#[case(0b00, true)]
#[case(0b01, true)]
fn test_polar_skips_unless_polarized(#[case] bits: u32, #[case] skips: bool) {
    let (mut machine, root, child) = machine_with_child("*");
    machine.path_mut(child).memory = BitMemory::with_capacity(2);
    machine.path_mut(child).memory.write(0, 2, bits);
    machine.path_mut(child).selection = Selection::whole(2);

    machine.dispatch(Opcode::POLAR).unwrap();
    assert_eq!(machine.path(root).ip, usize::from(skips));
}

#[test]
fn test_uplev_restarts_and_delev_lowers() {
    let (mut machine, root, _child) = machine_with_child("<>");
    machine.path_mut(root).start = 3;
    machine.path_mut(root).ip = 6;

    machine.dispatch(Opcode::UPLEV).unwrap();
    assert_eq!(machine.path(root).level, 1);
    assert_eq!(machine.path(root).ip, 2);

    machine.dispatch(Opcode::DELEV).unwrap();
    machine.dispatch(Opcode::DELEV).unwrap();
    assert_eq!(machine.path(root).level, 0);
}

#[test]
fn test_uplev_loop_stops_at_ceiling() {
    let (mut machine, root, _child) = machine_with_child("<>");
    machine.run().unwrap();
    // nine restarts, the gated tenth UPLEV, DELEV, then six idles
    assert_eq!(machine.steps(), 17);
    assert_eq!(machine.path(root).level, 8);
}

#[test]
fn test_privileged_floor_cannot_print() {
    let out = run_with_config("<$$$:", "", EngineConfig::default()).unwrap();
    assert_eq!(out, "");
}

#[test]
fn test_dealc_reports_bit_into_owner_program() {
    for report in [0u32, 1] {
        let (mut machine, root, child) = machine_with_child(".....#..");
        // child program: a single DEALC
        set_memory(&mut machine, child, 32, &[0xB000_0000]);
        let grandchild = machine.floors_mut().child_or_spawn(child);
        machine.path_mut(grandchild).memory.write(0, 1, report);
        machine.path_mut(root).ip = 5;

        machine.dispatch(Opcode::EXECS).unwrap();

        assert_eq!(machine.path(root).memory.read(20, 4), report);
        assert_eq!(machine.path(child).child, None);
        assert_eq!(machine.floors().len(), 2);
        assert_eq!(machine.running(), Some(root));
        assert_eq!(machine.written(), Some(child));
        assert!(machine.is_looping());
    }
}

#[test]
fn test_dealc_shrink_wraps_selection_index() {
    let (mut machine, _root, child) = machine_with_child("S");
    set_memory(&mut machine, child, 8, &[0]);
    machine.path_mut(child).selection = Selection::new(6, 2);

    machine.dispatch(Opcode::DEALC).unwrap();
    let path = machine.path(child);
    assert_eq!(path.capacity_bits(), 4);
    assert_eq!(path.selection, Selection::new(2, 1));
}

#[test]
fn test_doalc_ceiling_is_an_error_by_default() {
    let config = EngineConfig {
        max_capacity_bits: 4,
        ..EngineConfig::default()
    };
    let err = run_with_config("$$$", "", config).unwrap_err();
    assert!(matches!(
        err,
        ExecError::CapacityExceeded {
            floor: 1,
            max_bits: 4
        }
    ));
}

#[test]
fn test_doalc_ceiling_is_skipped_when_ignoring_overflow() {
    let config = EngineConfig {
        max_capacity_bits: 4,
        ignore_overflow: true,
        ..EngineConfig::default()
    };
    let (mut machine, _root, child) = machine_with_child("$$$");
    *machine.config_mut() = config;
    for _ in 0..3 {
        machine.dispatch(Opcode::DOALC).unwrap();
    }
    assert_eq!(machine.path(child).capacity_bits(), 4);
    assert_eq!(machine.path(child).selection, Selection::whole(4));
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_doalc_never_doubles_past_uneven_ceiling(#[case] ignore_overflow: bool) {
    let (mut machine, root, _child) = machine_with_child("$");
    *machine.config_mut() = EngineConfig {
        max_capacity_bits: 48,
        ignore_overflow,
        ..EngineConfig::default()
    };
    machine.set_written(root);

    let result = machine.dispatch(Opcode::DOALC);
    assert_eq!(result.is_ok(), ignore_overflow);
    if !ignore_overflow {
        assert!(matches!(
            result,
            Err(ExecError::CapacityExceeded {
                floor: 0,
                max_bits: 48
            })
        ));
    }
    assert_eq!(machine.path(root).capacity_bits(), 32);
    assert_eq!(machine.path(root).selection, Selection::whole(32));
}

#[test]
fn test_execs_is_gated_at_high_level() {
    let (mut machine, root, child) = machine_with_child("#");
    machine.path_mut(root).level = 8;

    machine.dispatch(Opcode::EXECS).unwrap();
    assert_eq!(machine.path(child).child, None);
    assert_eq!(machine.running(), Some(root));
    assert_eq!(machine.steps(), 0);
}

#[test]
fn test_nesting_past_depth_limit_fails() {
    let config = EngineConfig {
        max_depth: 1,
        ..EngineConfig::default()
    };
    let (mut machine, _root, child) = machine_with_child("#");
    *machine.config_mut() = config;
    // the child's own program is `#`, which needs a second nested loop
    set_memory(&mut machine, child, 4, &[0x5000_0000]);

    let err = machine.dispatch(Opcode::EXECS).unwrap_err();
    assert!(matches!(err, ExecError::DepthExceeded { limit: 1 }));
}
