use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::path::{Path, PathId};
use crate::selection::Selection;
use crate::vm::Machine;

/// Canonical, serializable view of one floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSnapshot {
    pub id: usize,
    pub floor: usize,
    pub level: u8,
    pub ip: usize,
    pub start: usize,
    pub capacity_bits: usize,
    pub selection: Selection,
    pub owner: Option<usize>,
    pub child: Option<usize>,
    /// Raw memory words, most significant bit first.
    pub words: Vec<u32>,
}

/// Canonical, serializable snapshot of the whole machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub root: Option<usize>,
    pub running: Option<usize>,
    pub written: Option<usize>,
    pub looping: bool,
    pub steps: u64,
    /// Floors ordered by depth, root first.
    pub floors: Vec<FloorSnapshot>,
}

impl FloorSnapshot {
    fn new(id: PathId, path: &Path) -> Self {
        Self {
            id: id.index(),
            floor: path.floor,
            level: path.level,
            ip: path.ip,
            start: path.start,
            capacity_bits: path.capacity_bits(),
            selection: path.selection,
            owner: path.owner.map(PathId::index),
            child: path.child.map(PathId::index),
            words: path.memory.words().to_vec(),
        }
    }
}

/// Build a canonical snapshot from a live machine.
pub fn snapshot_from_machine<W: Write>(machine: &Machine<W>) -> MachineSnapshot {
    let live = |id: Option<PathId>| {
        id.filter(|id| machine.floors().contains(*id))
            .map(PathId::index)
    };
    let mut floors: Vec<FloorSnapshot> = machine
        .floors()
        .iter()
        .map(|(id, path)| FloorSnapshot::new(id, path))
        .collect();
    floors.sort_by_key(|f| (f.floor, f.id));

    MachineSnapshot {
        root: live(machine.root()),
        running: live(machine.running()),
        written: live(machine.written()),
        looping: machine.is_looping(),
        steps: machine.steps(),
        floors,
    }
}

/// Serialize the machine state to canonical JSON.
pub fn serialize_state_to_json<W: Write>(machine: &Machine<W>) -> serde_json::Result<String> {
    serde_json::to_string(&snapshot_from_machine(machine))
}

pub fn serialize_state_to_pretty_json<W: Write>(
    machine: &Machine<W>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&snapshot_from_machine(machine))
}

pub fn deserialize_state_from_json(json: &str) -> serde_json::Result<MachineSnapshot> {
    serde_json::from_str(json)
}
