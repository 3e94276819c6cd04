use std::io::Write;

use dao_bytecode::Opcode;
use tracing::{Level, debug, trace};

use crate::error::{ExecError, Result};
use crate::path::PathId;
use crate::vm::Machine;

const STACK_RED_ZONE: usize = 32 * 1024;
const SWEET_STACK_SIZE: usize = 32 * STACK_RED_ZONE;

impl<W: Write> Machine<W> {
    /// Run `ctx`'s memory as a program, acting on its child floor.
    ///
    /// `caller` is the floor whose loop issued the EXECS, or `None` for the
    /// root. The call is skipped while the running floor sits at or above
    /// the EXECS ceiling.
    pub fn execute(&mut self, ctx: PathId, caller: Option<PathId>) -> Result<()> {
        let gate = self.running.unwrap_or(ctx);
        if self.floors[gate].level >= self.config.ceilings.execs {
            trace!(floor = self.floors[gate].floor, "EXECS gated");
            return Ok(());
        }
        if self.active.len() >= self.config.max_depth {
            return Err(ExecError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }

        self.running = Some(ctx);
        let child = self.floors.child_or_spawn(ctx);
        self.written = Some(child);
        let path = &mut self.floors[ctx];
        path.ip = path.selection.index / 4;
        path.start = path.ip;
        debug!(floor = path.floor, start = path.start, "entering floor");

        self.active.push(ctx);
        let looped = self.run_loop(ctx);
        self.active.pop();
        looped?;

        self.leave(ctx, caller);
        Ok(())
    }

    fn run_loop(&mut self, ctx: PathId) -> Result<()> {
        while self.doloop {
            let path = &self.floors[ctx];
            if path.ip >= path.capacity_bits() / 4 {
                break;
            }
            let running = self.running.unwrap_or(ctx);
            let Some(op) = self.fetch(running) else {
                break;
            };
            self.count_step()?;
            self.trace_step(running, op);

            match op {
                Opcode::EXECS => {
                    if let Some(target) = self.written {
                        stacker::maybe_grow(STACK_RED_ZONE, SWEET_STACK_SIZE, || {
                            self.execute(target, Some(ctx))
                        })?;
                    }
                }
                Opcode::IDLES => {}
                op => self.dispatch(op)?,
            }

            let path = &mut self.floors[ctx];
            path.ip = path.ip.wrapping_add(1);
        }
        Ok(())
    }

    fn leave(&mut self, ctx: PathId, caller: Option<PathId>) {
        let Some(caller) = caller else {
            if let Some(child) = self.floors[ctx].child {
                self.release(child);
            }
            self.written = self.written.filter(|id| self.floors.contains(*id));
            debug!("program finished");
            return;
        };
        if !self.doloop {
            if let Some(child) = self.floors.get(ctx).and_then(|p| p.child) {
                self.release(child);
            }
            self.doloop = true;
        }
        self.running = Some(caller);
        self.written = self.floors.get(caller).and_then(|p| p.child);
    }

    /// Free a subtree unless one of its floors still has a loop on the call stack.
    fn release(&mut self, id: PathId) {
        if self.floors.chain(id).any(|p| self.active.contains(&p)) {
            debug!(floor = self.floors[id].floor, "floor still running, kept");
            return;
        }
        self.floors.release(id);
    }

    /// Decode the instruction under `running`'s instruction pointer.
    pub(crate) fn fetch(&self, running: PathId) -> Option<Opcode> {
        let path = &self.floors[running];
        let offset = path.ip.checked_mul(4)?;
        if offset + 4 > path.capacity_bits() {
            return None;
        }
        Some(Opcode::from_low_bits(path.memory.read(offset, 4)))
    }

    fn count_step(&mut self) -> Result<()> {
        self.steps += 1;
        match self.config.max_steps {
            Some(limit) if self.steps > limit => Err(ExecError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    fn trace_step(&self, running: PathId, op: Opcode) {
        if !tracing::enabled!(Level::TRACE) {
            return;
        }
        let path = &self.floors[running];
        let written = self.written.and_then(|id| self.floors.get(id));
        if self.config.hide_data {
            trace!(
                floor = path.floor,
                ip = format_args!("{:05x}", path.ip),
                level = path.level,
                op = %op.symbol(),
                "step"
            );
        } else {
            trace!(
                floor = path.floor,
                ip = format_args!("{:05x}", path.ip),
                level = path.level,
                op = %op.symbol(),
                sel = ?written.map(|w| (w.selection.index, w.selection.len)),
                data = %written.map(|w| w.memory.to_bit_string()).unwrap_or_default(),
                "step"
            );
        }
    }
}
