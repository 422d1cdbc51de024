use vm64::demo::Demo;
use vm64::display::{DummyDisplay, QueueDisplay};
use vm64::instruction::*;
use vm64::memory::Region;
use vm64::{Machine, MachineConfig, RunState, VmError};

fn config_for(demo: Demo) -> MachineConfig {
    MachineConfig {
        isa: demo.isa(),
        pixel_format: demo.pixel_format(),
        ..MachineConfig::headless()
    }
}

#[test]
fn rectangle_demo_draws_a_blue_bar() -> Result<(), VmError> {
    let mut display = DummyDisplay::new();
    {
        let mut m = Machine::new(config_for(Demo::Rectangle), &mut display).unwrap();
        m.load(&Demo::Rectangle.bytes())?;
        assert_eq!(m.run(), RunState::Halted);
        assert_eq!(m.cycles(), 10);
        assert_eq!(m.registers().get(6), 0x0001_0000);
        let fb = m.framebuffer();
        assert_eq!(fb.get_pixel(100, 200), Some(0x1f));
        assert_eq!(fb.get_pixel(249, 209), Some(0x1f));
        assert_eq!(fb.get_pixel(250, 200), Some(0));
    }
    assert_eq!(display.frames(), 1);
    let img = display.last_frame().unwrap();
    assert_eq!(img.get(120, 205), Some((0, 0, 248)));
    Ok(())
}

#[test]
fn pixels_demo_on_the_earlier_opcode_map() -> Result<(), VmError> {
    let mut display = DummyDisplay::new();
    {
        let mut m = Machine::new(config_for(Demo::Pixels), &mut display).unwrap();
        m.load(&Demo::Pixels.bytes())?;
        assert_eq!(m.run(), RunState::Halted);
        assert_eq!(m.registers().get(3), 16);
        assert_eq!(m.framebuffer().get_pixel(10, 5), Some(0xff));
        assert_eq!(m.framebuffer().get_pixel(10, 6), Some(16));
    }
    let img = display.last_frame().unwrap();
    assert_eq!(img.get(10, 5), Some((224, 224, 192)));
    assert_eq!(img.get(10, 6), Some((0, 128, 0)));
    Ok(())
}

#[test]
fn sweep_demo_runs_until_told_otherwise() -> Result<(), VmError> {
    let (mut display, frames) = QueueDisplay::new(64);
    let mut m = Machine::new(config_for(Demo::Sweep), &mut display).unwrap();
    m.load(&Demo::Sweep.bytes())?;
    // 5 setup instructions, then 5 per frame
    assert_eq!(m.run_for(5 + 5 * 10), RunState::Running);
    assert_eq!(m.frames(), 10);
    assert_eq!(m.registers().get(1), 80);
    drop(m);
    assert_eq!(frames.len(), 10);
    let last = frames.try_iter().last().unwrap();
    // the square has marched right, leaving a trail behind it
    assert_ne!(last.get(0, 220), Some((0, 0, 0)));
    assert_ne!(last.get(100, 230), Some((0, 0, 0)));
    assert_eq!(last.get(200, 230), Some((0, 0, 0)));
    Ok(())
}

#[test]
fn demo_on_the_wrong_opcode_map_faults() -> Result<(), VmError> {
    let mut display = DummyDisplay::new();
    let config = MachineConfig {
        isa: InstructionSet::legacy(),
        ..MachineConfig::headless()
    };
    let mut m = Machine::new(config, &mut display).unwrap();
    m.load(&Demo::Rectangle.bytes())?;
    match m.run() {
        RunState::Faulted(f) => {
            assert_eq!(f.pc, 0);
            assert_eq!(f.error, VmError::UnknownOpcode(OP_LUI as u32));
        }
        other => panic!("expected a fault, got {:?}", other),
    }
    Ok(())
}

#[test]
fn rom_region_rejects_stores_from_load() -> Result<(), VmError> {
    let mut display = DummyDisplay::new();
    let config = MachineConfig {
        layout: vec![Region::rom("rom", 0, &[0xfc, 0, 0, 0])],
        ..MachineConfig::headless()
    };
    let mut m = Machine::new(config, &mut display).unwrap();
    // the image is already in rom; loading over it is refused
    assert_eq!(m.load(&[0]), Err(VmError::WriteProtected(0)));
    m.reset();
    assert_eq!(m.run(), RunState::Halted);
    Ok(())
}

#[test]
fn default_layout_stats() -> Result<(), VmError> {
    let mut display = DummyDisplay::new();
    let mut m = Machine::new(MachineConfig::headless(), &mut display).unwrap();
    m.load(&words_to_bytes(&[encode_op(OP_HALT)]))?;
    m.run();
    let stats = m.get_stats();
    assert_eq!(stats.writes, 4);
    assert_eq!(stats.reads, 4);
    // one non-zero byte in 8MB
    assert!(stats.rdram_usage_percent > 0.0 && stats.rdram_usage_percent < 0.001);
    Ok(())
}
