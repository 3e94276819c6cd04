use std::io::Write;

use dao_bytecode::Program;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::io::{ByteSource, EmptyInput};
use crate::memory::BitMemory;
use crate::path::{Floors, Path, PathId};

/// Interpreter state for one program: the floor arena plus the `running`
/// floor (whose memory supplies instructions) and the `written` floor
/// (which most opcodes act on).
pub struct Machine<W: Write = Vec<u8>> {
    pub(crate) floors: Floors,
    pub(crate) root: Option<PathId>,
    pub(crate) running: Option<PathId>,
    pub(crate) written: Option<PathId>,
    /// Cleared by DEALC on a one-bit floor to unwind the current loop.
    pub(crate) doloop: bool,
    pub(crate) config: EngineConfig,
    pub(crate) input: Box<dyn ByteSource>,
    pub(crate) output: W,
    /// Floors whose execution loops are on the call stack, outermost first.
    pub(crate) active: Vec<PathId>,
    pub(crate) steps: u64,
}

impl Machine<Vec<u8>> {
    /// A machine that collects READS output in memory.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_output(config, Vec::new())
    }
}

impl Default for Machine<Vec<u8>> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<W: Write> Machine<W> {
    pub fn with_output(config: EngineConfig, output: W) -> Self {
        Self {
            floors: Floors::new(),
            root: None,
            running: None,
            written: None,
            doloop: true,
            config,
            input: Box::new(EmptyInput),
            output,
            active: Vec::new(),
            steps: 0,
        }
    }

    pub fn set_input(&mut self, input: impl ByteSource + 'static) {
        self.input = Box::new(input);
    }

    /// Replace any loaded program. An empty program leaves the machine without a root.
    pub fn load(&mut self, program: &Program) -> Option<PathId> {
        self.load_packed(program.as_bytes(), program.bit_len())
    }

    /// Load `bit_len` bits of a packed nybble stream as the root floor.
    pub fn load_packed(&mut self, bytes: &[u8], bit_len: usize) -> Option<PathId> {
        self.floors = Floors::new();
        self.root = None;
        self.running = None;
        self.written = None;
        self.active.clear();
        self.doloop = true;
        if bit_len == 0 || bytes.is_empty() {
            debug!("empty program, nothing to load");
            return None;
        }
        let memory = BitMemory::from_packed(bytes, bit_len);
        debug!(bits = memory.capacity_bits(), "loaded root floor");
        let root = self.floors.insert(Path::root(memory));
        self.root = Some(root);
        Some(root)
    }

    /// Run the loaded program to completion.
    pub fn run(&mut self) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };
        self.doloop = true;
        self.steps = 0;
        self.active.clear();
        self.running = Some(root);
        let result = self.execute(root, None);
        self.output.flush()?;
        result
    }

    pub fn floors(&self) -> &Floors {
        &self.floors
    }

    pub fn floors_mut(&mut self) -> &mut Floors {
        &mut self.floors
    }

    pub fn root(&self) -> Option<PathId> {
        self.root
    }

    pub fn running(&self) -> Option<PathId> {
        self.running
    }

    pub fn written(&self) -> Option<PathId> {
        self.written
    }

    pub fn set_running(&mut self, id: PathId) {
        self.running = Some(id);
    }

    pub fn set_written(&mut self, id: PathId) {
        self.written = Some(id);
    }

    /// False once a termination signal is unwinding the current loop.
    pub fn is_looping(&self) -> bool {
        self.doloop
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn path(&self, id: PathId) -> &Path {
        &self.floors[id]
    }

    pub fn path_mut(&mut self, id: PathId) -> &mut Path {
        &mut self.floors[id]
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
