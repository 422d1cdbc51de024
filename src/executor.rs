use crate::error::VmError;
use crate::framebuffer::to_rgb_image;
use crate::instruction::DecodedOp;
use crate::machine::{Machine, RunState};
use log::debug;

// Fixed-operand opcodes take their operands from these registers. Programs
// set them up with addi/lui before issuing the draw.
pub const REG_X: u8 = 1;
pub const REG_Y: u8 = 2;
/// colour for draw-pixel
pub const REG_PIXEL_COLOR: u8 = 3;
pub const REG_WIDTH: u8 = 3;
pub const REG_HEIGHT: u8 = 4;
/// colour for draw-rectangle
pub const REG_RECT_COLOR: u8 = 5;

/// registers are unsigned, so a "negative" coordinate is just off screen
fn coord(m: &Machine<'_>, reg: u8) -> u32 {
    m.registers.get(reg)
}

/// colours are 16-bit; anything above is dropped
fn color(m: &Machine<'_>, reg: u8) -> u16 {
    m.registers.get(reg) as u16
}

/// Apply one decoded instruction.
///
/// PC has already been moved past the instruction. Every operation either
/// completes or fails before touching machine state.
pub fn execute(op: DecodedOp, m: &mut Machine<'_>) -> Result<(), VmError> {
    match op {
        DecodedOp::Add { rd, rs, rt } => {
            let v = m.registers.get(rs).wrapping_add(m.registers.get(rt));
            m.registers.set(rd, v);
        }
        DecodedOp::Sub { rd, rs, rt } => {
            let v = m.registers.get(rs).wrapping_sub(m.registers.get(rt));
            m.registers.set(rd, v);
        }
        DecodedOp::AddImmediate { rt, rs, imm } => {
            let v = m.registers.get(rs).wrapping_add(imm);
            m.registers.set(rt, v);
        }
        DecodedOp::LoadUpperImmediate { rt, imm } => {
            m.registers.set(rt, (imm as u32) << 16);
        }
        DecodedOp::Jump { target } => {
            // region bits come from the already-advanced pc
            let pc = (m.registers.pc() & 0xf000_0000) | (target << 2);
            m.registers.set_pc(pc);
        }
        DecodedOp::DrawPixel => {
            let (x, y, c) = (coord(m, REG_X), coord(m, REG_Y), color(m, REG_PIXEL_COLOR));
            m.framebuffer.set_pixel(x, y, c);
        }
        DecodedOp::DrawRectangle => {
            let (x, y) = (coord(m, REG_X), coord(m, REG_Y));
            let (w, h) = (coord(m, REG_WIDTH), coord(m, REG_HEIGHT));
            let c = color(m, REG_RECT_COLOR);
            m.framebuffer.fill_rect(x, y, w, h, c);
        }
        DecodedOp::Render => {
            let image = to_rgb_image(&m.framebuffer, m.pixel_format);
            m.display
                .present(&image)
                .map_err(|e| VmError::DisplaySink(e.to_string()))?;
            m.frames += 1;
            debug!("frame {} presented", m.frames);
            m.pacer.frame();
        }
        DecodedOp::Halt => {
            m.state = RunState::Halted;
        }
        DecodedOp::Unknown(op) => return Err(VmError::UnknownOpcode(op as u32)),
    }
    Ok(())
}
