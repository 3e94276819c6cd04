use std::io::Write;

use dao_bytecode::Opcode;
use tracing::{debug, trace};

use crate::error::{ExecError, Result};
use crate::path::PathId;
use crate::selection::Selection;
use crate::vm::Machine;

impl<W: Write> Machine<W> {
    /// Apply one opcode to the `written` floor. EXECS dispatched here runs
    /// `written` with the running floor as caller.
    pub fn dispatch(&mut self, op: Opcode) -> Result<()> {
        let Some(target) = self.written else {
            trace!(%op, "no written floor");
            return Ok(());
        };
        let level = self.running_level();
        let ceilings = self.config.ceilings;
        match op {
            Opcode::IDLES => {}
            Opcode::SWAPS => {
                if level < ceilings.swaps {
                    self.swaps(target);
                }
            }
            Opcode::LATER => self.later(target),
            Opcode::MERGE => self.merge(target),
            Opcode::SIFTS => {
                if level < ceilings.sifts {
                    self.sifts(target);
                }
            }
            Opcode::EXECS => self.execute(target, self.running)?,
            Opcode::DELEV => self.delev(),
            Opcode::EQUAL => {
                let path = &self.floors[target];
                if level < ceilings.equal && path.first_bit() != path.last_bit() {
                    self.skip();
                }
            }
            Opcode::HALVE => self.halve(target),
            Opcode::UPLEV => self.uplev(),
            Opcode::READS => {
                if level < ceilings.reads {
                    self.reads(target)?;
                }
            }
            Opcode::DEALC => {
                if level < ceilings.dealc {
                    self.dealc(target);
                }
            }
            Opcode::SPLIT => self.split(target),
            Opcode::POLAR => {
                let path = &self.floors[target];
                if level < ceilings.polar && !(path.first_bit() && !path.last_bit()) {
                    self.skip();
                }
            }
            Opcode::DOALC => {
                if level < ceilings.doalc {
                    self.doalc(target)?;
                }
            }
            Opcode::INPUT => {
                if level < ceilings.input {
                    self.input(target);
                }
            }
        }
        Ok(())
    }

    fn running_level(&self) -> u8 {
        self.running
            .and_then(|id| self.floors.get(id))
            .map_or(0, |p| p.level)
    }

    /// Advance the running floor past its next instruction.
    fn skip(&mut self) {
        if let Some(path) = self.running.and_then(|id| self.floors.get_mut(id)) {
            path.ip = path.ip.wrapping_add(1);
        }
    }

    fn swaps(&mut self, target: PathId) {
        let path = &mut self.floors[target];
        let Selection { index, len } = path.selection;
        path.memory.swap_halves(index, len);
    }

    fn later(&mut self, target: PathId) {
        let always_advance = self.running_level() >= self.config.ceilings.later;
        let path = &mut self.floors[target];
        if always_advance || path.selection.aligned() {
            path.selection = path.selection.advanced(path.capacity_bits());
        } else {
            self.merge(target);
        }
    }

    pub(crate) fn merge(&mut self, target: PathId) {
        if self.running_level() >= self.config.ceilings.merge {
            return;
        }
        let path = &mut self.floors[target];
        if let Some(merged) = path.selection.merged(path.capacity_bits()) {
            path.selection = merged;
            return;
        }
        let Some(owner) = path.owner else {
            return;
        };
        self.written = Some(owner);
        let owner = &mut self.floors[owner];
        owner.selection = if owner.capacity_bits() == 1 {
            Selection::new(0, 1)
        } else {
            Selection::new(1, 1)
        };
        trace!(floor = owner.floor, "merged up into owner");
    }

    pub(crate) fn halve(&mut self, target: PathId) {
        if self.running_level() >= self.config.ceilings.halve {
            return;
        }
        let path = &mut self.floors[target];
        if let Some(halved) = path.selection.halved() {
            path.selection = halved;
            return;
        }
        let Some(child) = path.child else {
            return;
        };
        self.written = Some(child);
        let child = &mut self.floors[child];
        child.selection = Selection::whole(child.capacity_bits());
        trace!(floor = child.floor, "halved down into child");
    }

    fn sifts(&mut self, target: PathId) {
        let path = &mut self.floors[target];
        let capacity = path.capacity_bits();
        let mut write = path.selection.index;
        let mut read = write;
        while read + 4 <= capacity {
            let nybble = path.memory.read_nybble(read);
            if nybble != 0 {
                if write != read {
                    path.memory.write_nybble(write, nybble);
                }
                write += 4;
            }
            read += 4;
        }
        while write + 4 <= capacity {
            path.memory.write_nybble(write, 0);
            write += 4;
        }
    }

    fn delev(&mut self) {
        if let Some(path) = self.running.and_then(|id| self.floors.get_mut(id)) {
            path.level = path.level.saturating_sub(1);
        }
    }

    fn uplev(&mut self) {
        let ceiling = self.config.ceilings.uplev;
        if let Some(path) = self.running.and_then(|id| self.floors.get_mut(id)) {
            if path.level >= ceiling {
                return;
            }
            path.level += 1;
            path.ip = path.start.wrapping_sub(1);
            debug!(floor = path.floor, level = path.level, "level raised, restarting");
        }
    }

    fn reads(&mut self, target: PathId) -> Result<()> {
        let path = &self.floors[target];
        let Selection { index, len } = path.selection;
        if len < 8 {
            let value = path.memory.read(index, len);
            write!(self.output, "{value:0len$b}")?;
            return Ok(());
        }
        let bytes: Vec<u8> = (index..index + len)
            .step_by(8)
            .map(|pos| path.memory.read(pos, 8) as u8)
            .collect();
        self.output.write_all(&bytes)?;
        Ok(())
    }

    fn dealc(&mut self, target: PathId) {
        if self.floors[target].capacity_bits() == 1 {
            let report = self.floors[target].memory.read(0, 1);
            let owner = self
                .running
                .and_then(|id| self.floors.get(id))
                .and_then(|p| p.owner);
            if let Some(owner) = owner.and_then(|id| self.floors.get_mut(id)) {
                let at = owner.ip.wrapping_mul(4);
                if at.checked_add(4).is_some_and(|end| end <= owner.capacity_bits()) {
                    owner.memory.write(at, 4, report);
                }
            }
            let path = &mut self.floors[target];
            path.memory.clear();
            path.selection = Selection::default();
            debug!(floor = path.floor, report, "floor terminated");
            self.doloop = false;
            return;
        }

        self.floors[target].memory.shrink();
        if self.floors[target].selection.len > 1 {
            self.halve(target);
        }
        let path = &mut self.floors[target];
        let capacity = path.capacity_bits();
        path.selection.len = path.selection.len.min(capacity);
        if path.selection.index + path.selection.len > capacity {
            path.selection.index -= capacity;
        }
    }

    fn split(&mut self, target: PathId) {
        if self.running_level() < self.config.ceilings.split {
            let Selection { index, len } = self.floors[target].selection;
            if len == 1 {
                let Some(child) = self.floors[target].child else {
                    return;
                };
                self.written = Some(child);
                let path = &mut self.floors[child];
                path.selection = Selection::whole(path.capacity_bits());
                self.split(child);
                self.halve(child);
                return;
            }
            self.floors[target].memory.polarize(index, len);
        }
        self.halve(target);
    }

    fn doalc(&mut self, target: PathId) -> Result<()> {
        let path = &mut self.floors[target];
        let max_bits = self.config.max_capacity_bits;
        let grown = path.capacity_bits().checked_mul(2);
        if grown.filter(|bits| *bits <= max_bits).is_none() {
            if self.config.ignore_overflow {
                trace!(floor = path.floor, "allocation ceiling reached, skipped");
                return Ok(());
            }
            return Err(ExecError::CapacityExceeded {
                floor: path.floor,
                max_bits,
            });
        }
        path.memory.grow();
        self.merge(target);
        Ok(())
    }

    fn input(&mut self, target: PathId) {
        let Selection { index, len } = self.floors[target].selection;
        if len < 8 {
            let byte = self.input.next_byte();
            self.floors[target].memory.write(index, len, byte.into());
            return;
        }
        for pos in (index..index + len).step_by(8) {
            let byte = self.input.next_byte();
            self.floors[target].memory.write(pos, 8, byte.into());
        }
    }
}
