//! # machine
//!
//! Owns everything a running program can touch:
//!  - the address space (RDRAM, PIF ROM, or whatever layout it was given)
//!  - the register file and program counter
//!  - the framebuffer
//!
//! and borrows the display it renders to. One cycle is:
//!  1. fetch the word at PC         -- faults if PC is unmapped
//!  2. decode it against the opcode table
//!  3. PC += 4
//!  4. execute                      -- may overwrite PC (jump)
//!
//! Any failure moves the machine to `Faulted`; `Halted` and `Faulted` are
//! terminal until the next `reset`/`load`.
use crate::display::Display;
use crate::error::{LayoutError, VmError};
use crate::executor::execute;
use crate::framebuffer::{Framebuffer, PixelFormat, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::instruction::InstructionSet;
use crate::memory::{default_layout, AddressSpace, MemoryMap, MemoryStats, Region};
use crate::pacing::{FramePacer, NoPacing, SpinPacer};
use crate::register::{RegisterFile, ZeroRegister};
use log::{debug, info, trace, warn};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// where a fault happened and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// address of the instruction being run when it hit
    pub pc: u32,
    pub error: VmError,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pc=0x{:08x})", self.error, self.pc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
    Faulted(Fault),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Asks a running machine to stop at the next instruction boundary. Clones
/// share the same flag, so one can be handed to a display or another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        StopHandle::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// read and clear the request
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// how to pace rendered frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    None,
    /// sleep out the rest of each frame period
    Fixed(Duration),
}

/// Everything that shapes a machine before it runs.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub layout: Vec<Region>,
    pub isa: InstructionSet,
    pub pixel_format: PixelFormat,
    pub zero_register: ZeroRegister,
    pub screen_width: usize,
    pub screen_height: usize,
    pub pacing: Pacing,
}

impl MachineConfig {
    /// defaults, but without frame pacing
    pub fn headless() -> Self {
        MachineConfig {
            pacing: Pacing::None,
            ..MachineConfig::default()
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            layout: default_layout(),
            isa: InstructionSet::default(),
            pixel_format: PixelFormat::default(),
            zero_register: ZeroRegister::default(),
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            pacing: Pacing::Fixed(crate::pacing::FRAME_PERIOD),
        }
    }
}

pub struct Machine<'a> {
    pub(crate) memory: AddressSpace,
    pub(crate) registers: RegisterFile,
    pub(crate) framebuffer: Framebuffer,
    pub(crate) display: &'a mut dyn Display,
    pub(crate) pacer: Box<dyn FramePacer>,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) state: RunState,
    pub(crate) frames: u64,
    isa: InstructionSet,
    stop: StopHandle,
    cycles: u64,
}

impl<'a> Machine<'a> {
    pub fn new(
        config: MachineConfig,
        display: &'a mut dyn Display,
    ) -> Result<Machine<'a>, LayoutError> {
        let pacer: Box<dyn FramePacer> = match config.pacing {
            Pacing::None => Box::new(NoPacing),
            Pacing::Fixed(period) => Box::new(SpinPacer::new(period)),
        };
        debug!(
            "new machine: isa={} format={:?} r0={:?} screen={}x{}",
            config.isa.name(),
            config.pixel_format,
            config.zero_register,
            config.screen_width,
            config.screen_height
        );
        Ok(Machine {
            memory: AddressSpace::new(config.layout)?,
            registers: RegisterFile::new(config.zero_register),
            framebuffer: Framebuffer::new(config.screen_width, config.screen_height),
            display,
            pacer,
            pixel_format: config.pixel_format,
            state: RunState::Running,
            frames: 0,
            isa: config.isa,
            stop: StopHandle::new(),
            cycles: 0,
        })
    }

    /// share an existing stop flag (e.g. one a display also holds)
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_pacer(mut self, pacer: Box<dyn FramePacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Back to power-on state. Memory is left as it is.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.framebuffer.clear(0);
        self.state = RunState::Running;
        self.cycles = 0;
        self.frames = 0;
    }

    /// reset, then put a program at address 0
    pub fn load(&mut self, program: &[u8]) -> Result<(), VmError> {
        self.reset();
        self.memory.load(0, program)?;
        info!("loaded {} bytes at 0x00000000", program.len());
        Ok(())
    }

    /// load a program of unknown length from a reader
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), io::Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load(&buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Run one fetch/decode/execute cycle. Does nothing once terminal.
    pub fn step(&mut self) -> &RunState {
        if !self.state.is_running() {
            return &self.state;
        }
        let pc = self.registers.pc();
        if let Err(error) = self.cycle(pc) {
            self.fault(pc, error);
        }
        if self.state == RunState::Halted {
            info!("halted after {} cycles", self.cycles);
        }
        &self.state
    }

    fn cycle(&mut self, pc: u32) -> Result<(), VmError> {
        let word = self.memory.read_word(pc)?;
        let op = self.isa.decode(word);
        self.cycles += 1;
        trace!("{:08x}: {:08x}  {}", pc, word, op);
        self.registers.set_pc(pc.wrapping_add(4));
        execute(op, self)
    }

    fn fault(&mut self, pc: u32, error: VmError) {
        warn!("fault at 0x{:08x}: {}", pc, error);
        self.state = RunState::Faulted(Fault { pc, error });
    }

    /// Run until halted, faulted or asked to stop. A stopped machine is still
    /// `Running` and picks up where it left off on the next call.
    pub fn run(&mut self) -> RunState {
        self.run_for(u64::MAX)
    }

    /// as `run`, but give up after `max_cycles` cycles
    pub fn run_for(&mut self, max_cycles: u64) -> RunState {
        let mut n = 0;
        while self.state.is_running() && n < max_cycles {
            if self.stop.take() {
                info!("stop requested at pc=0x{:08x}", self.registers.pc());
                break;
            }
            self.step();
            n += 1;
        }
        self.state.clone()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// the fault that ended the run, if any
    pub fn last_fault(&self) -> Option<&Fault> {
        match &self.state {
            RunState::Faulted(f) => Some(f),
            _ => None,
        }
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.memory
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    pub fn isa(&self) -> &InstructionSet {
        &self.isa
    }

    /// fetch cycles since the last reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// frames handed to the display since the last reset
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn get_stats(&self) -> MemoryStats {
        self.memory.get_stats()
    }
}
