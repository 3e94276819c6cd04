//! Execution floors.
//!
//! Each [`Path`] owns its memory and at most one child. Floors live in the
//! [`Floors`] arena and refer to each other by [`PathId`]: `child` is the
//! owning edge, `owner` only points back up.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::memory::BitMemory;
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathId(usize);

impl PathId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub memory: BitMemory,
    pub selection: Selection,
    /// Instruction pointer in nybbles.
    pub ip: usize,
    /// Instruction pointer at the most recent loop entry.
    pub start: usize,
    pub level: u8,
    pub floor: usize,
    pub owner: Option<PathId>,
    pub child: Option<PathId>,
}

impl Path {
    pub fn new(memory: BitMemory) -> Self {
        Self {
            memory,
            selection: Selection::default(),
            ip: 0,
            start: 0,
            level: 0,
            floor: 0,
            owner: None,
            child: None,
        }
    }

    /// A root floor whose selection covers its whole program.
    pub fn root(memory: BitMemory) -> Self {
        let selection = Selection::whole(memory.capacity_bits());
        Self {
            selection,
            ..Self::new(memory)
        }
    }

    pub fn capacity_bits(&self) -> usize {
        self.memory.capacity_bits()
    }

    pub fn first_bit(&self) -> bool {
        self.memory.bit(self.selection.first_bit())
    }

    pub fn last_bit(&self) -> bool {
        self.memory.bit(self.selection.last_bit())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Floors {
    slots: Vec<Option<Path>>,
    vacant: Vec<usize>,
}

impl Floors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: Path) -> PathId {
        match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot] = Some(path);
                PathId(slot)
            }
            None => {
                self.slots.push(Some(path));
                PathId(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, id: PathId) -> Option<&Path> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: PathId) -> Option<&mut Path> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: PathId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live floors.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The child of `parent`, created with a one-bit memory on first use.
    pub fn child_or_spawn(&mut self, parent: PathId) -> PathId {
        if let Some(child) = self[parent].child {
            return child;
        }
        let floor = self[parent].floor + 1;
        let child = self.insert(Path {
            floor,
            owner: Some(parent),
            ..Path::new(BitMemory::new())
        });
        self[parent].child = Some(child);
        trace!(floor, "spawned floor");
        child
    }

    /// Iterate `id` and every floor below it.
    pub fn chain(&self, id: PathId) -> impl Iterator<Item = PathId> + '_ {
        std::iter::successors(Some(id), move |cur| self.get(*cur).and_then(|p| p.child))
    }

    /// Drop `id` and everything it owns, and detach it from its owner.
    pub fn release(&mut self, id: PathId) {
        if let Some(owner) = self.get(id).and_then(|p| p.owner) {
            if let Some(path) = self.get_mut(owner) {
                if path.child == Some(id) {
                    path.child = None;
                }
            }
        }
        let mut next = Some(id);
        while let Some(cur) = next {
            let Some(path) = self.slots.get_mut(cur.0).and_then(Option::take) else {
                break;
            };
            self.vacant.push(cur.0);
            next = path.child;
        }
    }

    /// Live floors, root first.
    pub fn iter(&self) -> impl Iterator<Item = (PathId, &Path)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (PathId(i), p)))
    }
}

impl Index<PathId> for Floors {
    type Output = Path;

    fn index(&self, id: PathId) -> &Path {
        self.get(id)
            .unwrap_or_else(|| panic!("floor {} was released", id.0))
    }
}

impl IndexMut<PathId> for Floors {
    fn index_mut(&mut self, id: PathId) -> &mut Path {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("floor {} was released", id.0))
    }
}
