//! A small 32-bit load/store machine with a framebuffer.
//!
//! ## Design
//!
//! * a cut-down MIPS-style instruction set; not cycle accurate, not binary
//!   compatible with anything
//! * big-endian words, fixed 4-byte instructions, no branch delay slot
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * rendering paces itself to ~60fps, but the pacing is pluggable so the
//!   core works in blocking and event-driven hosts alike
//!
//! Enums to represent:
//!
//! * memory map
//!    - disjoint regions with read/write permissions (RAM, ROM)
//!    - initialised from a byte sequence loaded at address 0
//! * instruction set
//!    - opcode table as data, so the different historical opcode maps share
//!      one decoder and one executor
//! * the machine itself
//!    - pub .step() -- one fetch/decode/execute cycle
//!    - pub .run() -- until halted, faulted or asked to stop
//!    - faults never escape the machine; callers look at the run state
//! * some config (e.g. which opcode map, which pixel format)
//! * display, with trait for rendering
//!    - the machine hands over a finished RGB image and doesn't care what
//!      happens to it
//!
//! Model
//!
//! Machine(config, display)
//!  |-- address space(layout)
//!  |-- register file(zero register policy)
//!  |-- framebuffer --> to_rgb_image --> display
//!  |-- instruction set
//!  `-- run loop
//!       |-- stop requested? return
//!       |-- word = memory[pc]
//!       |-- op = decode(word)
//!       |-- pc += 4
//!       `-- execute(op)
pub mod demo;
pub mod display;
pub mod error;
pub mod executor;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod pacing;
pub mod register;

pub use error::{FaultKind, LayoutError, VmError};
pub use machine::{Fault, Machine, MachineConfig, Pacing, RunState, StopHandle};
