//! Built-in programs, for when there's no ROM to hand.
use crate::framebuffer::PixelFormat;
use crate::instruction::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// one blue bar, then halt
    Rectangle,
    /// two pixels using the earlier opcode map, then halt
    Pixels,
    /// a square marching across the screen forever
    Sweep,
}

impl Demo {
    pub fn isa(self) -> InstructionSet {
        match self {
            Demo::Rectangle => InstructionSet::extended(),
            Demo::Pixels => InstructionSet::legacy(),
            Demo::Sweep => InstructionSet::superset(),
        }
    }

    /// the earlier map went with 8-bit colour
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Demo::Pixels => PixelFormat::Rgb332,
            _ => PixelFormat::Rgb555,
        }
    }

    #[rustfmt::skip]
    pub fn words(self) -> Vec<u32> {
        match self {
            Demo::Rectangle => vec![
                encode_i(OP_LUI, 0, 6, 0x0001),        // lui  r6, 0x0001
                encode_i(OP_ADDI, 6, 6, 0x0000),       // addi r6, r6, 0      r6 = 0x10000
                encode_i(OP_ADDI, 0, 1, 100),          // addi r1, r0, 100    x
                encode_i(OP_ADDI, 0, 2, 200),          // addi r2, r0, 200    y
                encode_i(OP_ADDI, 0, 3, 150),          // addi r3, r0, 150    width
                encode_i(OP_ADDI, 0, 4, 10),           // addi r4, r0, 10     height
                encode_i(OP_ADDI, 0, 5, 0x1f),         // addi r5, r0, 0x1f   blue
                encode_op(OP_DRAW_RECT),               // rect
                encode_op(OP_RENDER),                  // render
                encode_op(OP_HALT),                    // halt
            ],
            Demo::Pixels => vec![
                encode_i(OP_LEGACY_ADDI, 1, 0, 10),    // r1 += 10            x
                encode_i(OP_LEGACY_ADDI, 2, 0, 5),     // r2 += 5             y
                encode_i(OP_LEGACY_ADDI, 3, 0, 0xff),  // r3 += 0xff          white
                encode_op(OP_DRAW_PIXEL),              // pixel (10, 5)
                encode_i(OP_LEGACY_ADDI, 2, 0, 1),     // r2 += 1
                encode_r(1, 2, 3, 0),                  // add r3, r1, r2      colour 16
                encode_op(OP_DRAW_PIXEL),              // pixel (10, 6)
                encode_op(OP_LEGACY_RENDER),           // render
                encode_op(OP_HALT),                    // halt
            ],
            Demo::Sweep => vec![
                encode_i(OP_ADDI, 0, 1, 0),            // addi r1, r0, 0      x
                encode_i(OP_ADDI, 0, 2, 220),          // addi r2, r0, 220    y
                encode_i(OP_ADDI, 0, 3, 40),           // addi r3, r0, 40     width
                encode_i(OP_ADDI, 0, 4, 40),           // addi r4, r0, 40     height
                encode_i(OP_ADDI, 0, 5, 0x1f),         // addi r5, r0, 0x1f   colour
                encode_op(OP_DRAW_RECT),               // loop: rect
                encode_op(OP_RENDER),                  // render
                encode_i(OP_ADDI, 1, 1, 8),            // addi r1, r1, 8
                encode_i(OP_ADDI, 5, 5, 0x0421),       // addi r5, r5, 0x421  brighten
                encode_j(OP_J, 5),                     // j loop
            ],
        }
    }

    pub fn bytes(self) -> Vec<u8> {
        words_to_bytes(&self.words())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demos_decode_cleanly() {
        for demo in [Demo::Rectangle, Demo::Pixels, Demo::Sweep] {
            let isa = demo.isa();
            for w in demo.words() {
                assert!(
                    !matches!(isa.decode(w), DecodedOp::Unknown(_)),
                    "{:?}: {:08x}",
                    demo,
                    w
                );
            }
        }
    }

    #[test]
    fn test_sweep_loops_back() {
        let words = Demo::Sweep.words();
        assert_eq!(
            SUPERSET.decode(*words.last().unwrap()),
            DecodedOp::Jump { target: 5 }
        );
        assert_eq!(SUPERSET.decode(words[5]), DecodedOp::DrawRectangle);
    }
}
