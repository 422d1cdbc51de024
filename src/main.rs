use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{info, log_enabled, trace};
use std::fs::File;
use std::path::PathBuf;

use vm64::demo::Demo;
use vm64::display::{Display, DummyDisplay, TermDisplay};
use vm64::framebuffer::PixelFormat;
use vm64::instruction::InstructionSet;
use vm64::register::ZeroRegister;
use vm64::{Machine, MachineConfig, Pacing, RunState, StopHandle};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum IsaArg {
    Superset,
    Legacy,
    Extended,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    Rgb555,
    Rgb332,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ZeroArg {
    Mutable,
    Hardwired,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum DemoArg {
    Rectangle,
    Pixels,
    Sweep,
}

/// Run a program on the vm64 machine, drawing its framebuffer in the terminal.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// raw program image, loaded at address 0; a built-in demo runs otherwise
    rom: Option<PathBuf>,

    /// built-in demo to run when no ROM is given
    #[arg(long, value_enum, default_value = "rectangle")]
    demo: DemoArg,

    /// opcode map (defaults to superset, or the demo's own map)
    #[arg(long, value_enum)]
    isa: Option<IsaArg>,

    /// how packed colours turn into RGB (defaults to rgb555, or the demo's own)
    #[arg(long, value_enum)]
    pixel_format: Option<FormatArg>,

    #[arg(long, value_enum, default_value = "mutable")]
    zero_register: ZeroArg,

    /// render as fast as possible
    #[arg(long)]
    no_pacing: bool,

    /// stop after this many cycles
    #[arg(long)]
    max_cycles: Option<u64>,

    /// don't draw anything; frames are counted and dropped
    #[arg(long)]
    headless: bool,

    /// print memory statistics at the end
    #[arg(long)]
    stats: bool,

    /// terminal columns to squash the screen into
    #[arg(long, default_value_t = 80)]
    cols: usize,

    /// terminal rows to squash the screen into
    #[arg(long, default_value_t = 30)]
    rows: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // log lines would scribble over the tui, so keep it quiet unless asked
    // Use RUST_LOG=trace to see every instruction
    let default_filter = if args.headless { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let demo = match args.demo {
        DemoArg::Rectangle => Demo::Rectangle,
        DemoArg::Pixels => Demo::Pixels,
        DemoArg::Sweep => Demo::Sweep,
    };
    let (default_isa, default_format) = match args.rom {
        Some(_) => (InstructionSet::default(), PixelFormat::default()),
        None => (demo.isa(), demo.pixel_format()),
    };
    let config = MachineConfig {
        isa: match args.isa {
            Some(IsaArg::Superset) => InstructionSet::superset(),
            Some(IsaArg::Legacy) => InstructionSet::legacy(),
            Some(IsaArg::Extended) => InstructionSet::extended(),
            None => default_isa,
        },
        pixel_format: match args.pixel_format {
            Some(FormatArg::Rgb555) => PixelFormat::Rgb555,
            Some(FormatArg::Rgb332) => PixelFormat::Rgb332,
            None => default_format,
        },
        zero_register: match args.zero_register {
            ZeroArg::Mutable => ZeroRegister::Mutable,
            ZeroArg::Hardwired => ZeroRegister::Hardwired,
        },
        pacing: if args.no_pacing {
            Pacing::None
        } else {
            MachineConfig::default().pacing
        },
        ..MachineConfig::default()
    };

    // initialise
    let stop = StopHandle::new();
    let mut display: Box<dyn Display> = if args.headless {
        Box::new(DummyDisplay::new())
    } else {
        Box::new(TermDisplay::new(args.cols, args.rows, stop.clone())?)
    };
    let mut machine = Machine::new(config, display.as_mut())?.with_stop_handle(stop);

    // load a program
    match &args.rom {
        Some(path) => {
            let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            machine
                .load_program(&mut f)
                .with_context(|| format!("loading {}", path.display()))?;
        }
        None => {
            info!("no ROM given, running the {:?} demo", demo);
            machine.load(&demo.bytes())?;
        }
    }

    let state = match args.max_cycles {
        Some(n) => machine.run_for(n),
        None => machine.run(),
    };

    if log_enabled!(log::Level::Trace) {
        trace!("Final register state:");
        for (i, v) in machine.registers().as_slice().iter().enumerate() {
            trace!("r{} = 0x{:08x}", i, v);
        }
        trace!("pc = 0x{:08x}", machine.registers().pc());
    }

    let cycles = machine.cycles();
    let frames = machine.frames();
    let stats = machine.get_stats();
    drop(machine);
    // hands the terminal back
    drop(display);

    // shove some junk on stdout to stop the cli messing up the last frame
    if !args.headless {
        for _ in 0..2 {
            println!();
        }
    }
    println!("{} cycles, {} frames", cycles, frames);
    if args.stats {
        println!("Memory Reads: {}", stats.reads);
        println!("Memory Writes: {}", stats.writes);
        println!("RDRAM Usage: {:.2}%", stats.rdram_usage_percent);
    }

    match state {
        RunState::Halted => Ok(()),
        RunState::Running => {
            info!("stopped before the program finished");
            Ok(())
        }
        RunState::Faulted(fault) => bail!(
            "emulation error: {} at 0x{:08x} (pc=0x{:08x})",
            fault.error.kind(),
            fault.error.value(),
            fault.pc
        ),
    }
}
