//! Instruction words and how to take them apart.
//!
//! Every instruction is one big-endian 32-bit word. The top six bits are the
//! opcode; what the other 26 mean depends on the format:
//!
//! ```text
//!  31    26 25  21 20  16 15  11 10   6 5     0
//! | opcode |  rs  |  rt  |  rd  |  --  | funct |   register
//! | opcode |  rs  |  rt  |      imm16           |   immediate
//! | opcode |           target26                 |   jump
//! | opcode |           (ignored)                |   fixed operand
//! ```
//!
//! Which opcode maps to which format and operation is data, held in an
//! [`InstructionSet`], so the two historical opcode maps (and their union)
//! share one decoder.
use std::fmt;

pub const OP_SPECIAL: u8 = 0x00;
pub const OP_J: u8 = 0x02;
pub const OP_DRAW_PIXEL: u8 = 0x03;
pub const OP_ADDI: u8 = 0x08;
pub const OP_LUI: u8 = 0x0f;
pub const OP_DRAW_RECT: u8 = 0x2d;
pub const OP_RENDER: u8 = 0x2e;
pub const OP_HALT: u8 = 0x3f;

// the earlier opcode map numbered things differently
pub const OP_LEGACY_ADDI: u8 = 0x01;
pub const OP_LEGACY_RENDER: u8 = 0x04;

pub const FUNCT_ADD: u8 = 0x20;
pub const FUNCT_SUB: u8 = 0x22;

pub fn opcode(word: u32) -> u8 {
    (word >> 26) as u8
}

pub fn rs(word: u32) -> u8 {
    ((word >> 21) & 0x1f) as u8
}

pub fn rt(word: u32) -> u8 {
    ((word >> 16) & 0x1f) as u8
}

pub fn rd(word: u32) -> u8 {
    ((word >> 11) & 0x1f) as u8
}

pub fn funct(word: u32) -> u8 {
    (word & 0x3f) as u8
}

pub fn imm16(word: u32) -> u16 {
    (word & 0xffff) as u16
}

pub fn target26(word: u32) -> u32 {
    word & 0x03ff_ffff
}

/// Widen a 16-bit two's-complement immediate to 32 bits.
pub fn sign_extend16(v: u16) -> u32 {
    v as i16 as i32 as u32
}

/// A decoded instruction with its operands resolved.
///
/// Only register *indices* live here; register contents are read at execute
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOp {
    Add { rd: u8, rs: u8, rt: u8 },
    Sub { rd: u8, rs: u8, rt: u8 },
    /// `imm` is already widened to 32 bits
    AddImmediate { rt: u8, rs: u8, imm: u32 },
    LoadUpperImmediate { rt: u8, imm: u16 },
    /// raw 26-bit target field; the new PC is built at execute time
    Jump { target: u32 },
    DrawPixel,
    DrawRectangle,
    Render,
    Halt,
    Unknown(u8),
}

impl fmt::Display for DecodedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodedOp::Add { rd, rs, rt } => write!(f, "add r{}, r{}, r{}", rd, rs, rt),
            DecodedOp::Sub { rd, rs, rt } => write!(f, "sub r{}, r{}, r{}", rd, rs, rt),
            DecodedOp::AddImmediate { rt, rs, imm } => {
                write!(f, "addi r{}, r{}, {}", rt, rs, imm as i32)
            }
            DecodedOp::LoadUpperImmediate { rt, imm } => write!(f, "lui r{}, 0x{:04x}", rt, imm),
            DecodedOp::Jump { target } => write!(f, "j 0x{:07x}", target << 2),
            DecodedOp::DrawPixel => f.write_str("pixel"),
            DecodedOp::DrawRectangle => f.write_str("rect"),
            DecodedOp::Render => f.write_str("render"),
            DecodedOp::Halt => f.write_str("halt"),
            DecodedOp::Unknown(op) => write!(f, ".word op=0x{:02x}", op),
        }
    }
}

/// The format and meaning an opcode is given by an instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// register format, dispatched on funct (add, sub)
    Register,
    /// register format where funct is ignored and every op is an add
    RegisterAddOnly,
    /// `rt = rs + sign_extend(imm16)`
    AddImmediate,
    /// `rs = rs + zero_extend(imm16)`
    AddImmediateInPlace,
    /// `rt = imm16 << 16`
    LoadUpperImmediate,
    Jump,
    DrawPixel,
    DrawRectangle,
    Render,
    Halt,
}

/// opcode -> encoding table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSet {
    name: &'static str,
    table: [Option<Encoding>; 64],
}

impl InstructionSet {
    pub const fn empty(name: &'static str) -> Self {
        InstructionSet {
            name,
            table: [None; 64],
        }
    }

    /// assign an encoding to an opcode, replacing whatever was there
    pub const fn with(mut self, opcode: u8, encoding: Encoding) -> Self {
        self.table[(opcode & 0x3f) as usize] = Some(encoding);
        self
    }

    /// The richer map: arithmetic, load-upper, rectangles, render, halt.
    pub const fn extended() -> Self {
        InstructionSet::empty("extended")
            .with(OP_SPECIAL, Encoding::Register)
            .with(OP_ADDI, Encoding::AddImmediate)
            .with(OP_LUI, Encoding::LoadUpperImmediate)
            .with(OP_DRAW_RECT, Encoding::DrawRectangle)
            .with(OP_RENDER, Encoding::Render)
            .with(OP_HALT, Encoding::Halt)
    }

    /// The earlier map: jumps and single pixels, but looser arithmetic.
    pub const fn legacy() -> Self {
        InstructionSet::empty("legacy")
            .with(OP_SPECIAL, Encoding::RegisterAddOnly)
            .with(OP_LEGACY_ADDI, Encoding::AddImmediateInPlace)
            .with(OP_J, Encoding::Jump)
            .with(OP_DRAW_PIXEL, Encoding::DrawPixel)
            .with(OP_LEGACY_RENDER, Encoding::Render)
            .with(OP_HALT, Encoding::Halt)
    }

    /// `extended` plus jump and draw-pixel
    pub const fn superset() -> Self {
        let mut isa = InstructionSet::extended()
            .with(OP_J, Encoding::Jump)
            .with(OP_DRAW_PIXEL, Encoding::DrawPixel);
        isa.name = "superset";
        isa
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn encoding(&self, opcode: u8) -> Option<Encoding> {
        self.table[(opcode & 0x3f) as usize]
    }

    /// lowest opcode carrying `encoding`, for building programs
    pub fn opcode_for(&self, encoding: Encoding) -> Option<u8> {
        (0u8..64).find(|op| self.table[*op as usize] == Some(encoding))
    }

    /// Decode a word. Never fails: anything unrecognised is `Unknown`.
    pub fn decode(&self, word: u32) -> DecodedOp {
        let op = opcode(word);
        let encoding = match self.encoding(op) {
            Some(e) => e,
            None => return DecodedOp::Unknown(op),
        };
        match encoding {
            Encoding::Register => {
                let (rd, rs, rt) = (rd(word), rs(word), rt(word));
                match funct(word) {
                    FUNCT_ADD => DecodedOp::Add { rd, rs, rt },
                    FUNCT_SUB => DecodedOp::Sub { rd, rs, rt },
                    _ => DecodedOp::Unknown(op),
                }
            }
            Encoding::RegisterAddOnly => DecodedOp::Add {
                rd: rd(word),
                rs: rs(word),
                rt: rt(word),
            },
            Encoding::AddImmediate => DecodedOp::AddImmediate {
                rt: rt(word),
                rs: rs(word),
                imm: sign_extend16(imm16(word)),
            },
            Encoding::AddImmediateInPlace => DecodedOp::AddImmediate {
                rt: rs(word),
                rs: rs(word),
                imm: imm16(word) as u32,
            },
            Encoding::LoadUpperImmediate => DecodedOp::LoadUpperImmediate {
                rt: rt(word),
                imm: imm16(word),
            },
            Encoding::Jump => DecodedOp::Jump {
                target: target26(word),
            },
            Encoding::DrawPixel => DecodedOp::DrawPixel,
            Encoding::DrawRectangle => DecodedOp::DrawRectangle,
            Encoding::Render => DecodedOp::Render,
            Encoding::Halt => DecodedOp::Halt,
        }
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        InstructionSet::superset()
    }
}

/// the default opcode map
pub const SUPERSET: InstructionSet = InstructionSet::superset();

/// decode against the default opcode map
pub fn decode(word: u32) -> DecodedOp {
    SUPERSET.decode(word)
}

/// register format word
pub fn encode_r(rs: u8, rt: u8, rd: u8, funct: u8) -> u32 {
    ((rs as u32 & 0x1f) << 21)
        | ((rt as u32 & 0x1f) << 16)
        | ((rd as u32 & 0x1f) << 11)
        | (funct as u32 & 0x3f)
}

/// immediate format word
pub fn encode_i(opcode: u8, rs: u8, rt: u8, imm: u16) -> u32 {
    ((opcode as u32 & 0x3f) << 26)
        | ((rs as u32 & 0x1f) << 21)
        | ((rt as u32 & 0x1f) << 16)
        | imm as u32
}

/// jump format word
pub fn encode_j(opcode: u8, target: u32) -> u32 {
    ((opcode as u32 & 0x3f) << 26) | (target & 0x03ff_ffff)
}

/// opcode-only word
pub fn encode_op(opcode: u8) -> u32 {
    (opcode as u32 & 0x3f) << 26
}

/// flatten words into the big-endian byte stream the machine loads
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_field_extraction() {
        // add r3, r1, r2
        let w = 0x0022_1820;
        assert_eq!(opcode(w), 0);
        assert_eq!(rs(w), 1);
        assert_eq!(rt(w), 2);
        assert_eq!(rd(w), 3);
        assert_eq!(funct(w), 0x20);
        assert_eq!(encode_r(1, 2, 3, FUNCT_ADD), w);
    }

    #[test]
    fn test_sign_extend16() {
        assert_eq!(sign_extend16(0x8000), 0xffff_8000);
        assert_eq!(sign_extend16(0x8000) as i32, -32768);
        assert_eq!(sign_extend16(0x7fff), 0x0000_7fff);
        assert_eq!(sign_extend16(0xffff), 0xffff_ffff);
        assert_eq!(sign_extend16(0), 0);
    }

    #[test]
    fn test_decode_register_format() {
        assert_eq!(
            decode(encode_r(1, 2, 3, FUNCT_ADD)),
            DecodedOp::Add { rd: 3, rs: 1, rt: 2 }
        );
        assert_eq!(
            decode(encode_r(4, 5, 6, FUNCT_SUB)),
            DecodedOp::Sub { rd: 6, rs: 4, rt: 5 }
        );
        // any other funct is not ours
        assert_eq!(decode(encode_r(1, 2, 3, 0x24)), DecodedOp::Unknown(0));
    }

    #[test]
    fn test_decode_immediates() {
        assert_eq!(
            decode(encode_i(OP_ADDI, 2, 1, 0xfffe)),
            DecodedOp::AddImmediate {
                rt: 1,
                rs: 2,
                imm: 0xffff_fffe
            }
        );
        // lui ignores rs and never sign extends
        assert_eq!(
            decode(encode_i(OP_LUI, 7, 1, 0x8001)),
            DecodedOp::LoadUpperImmediate { rt: 1, imm: 0x8001 }
        );
    }

    #[test]
    fn test_decode_jump_and_fixed() {
        assert_eq!(
            decode(encode_j(OP_J, 0x03ff_ffff)),
            DecodedOp::Jump {
                target: 0x03ff_ffff
            }
        );
        // fixed operand opcodes ignore the low 26 bits
        assert_eq!(decode(encode_op(OP_DRAW_RECT) | 0x1234), DecodedOp::DrawRectangle);
        assert_eq!(decode(encode_op(OP_DRAW_PIXEL)), DecodedOp::DrawPixel);
        assert_eq!(decode(encode_op(OP_RENDER)), DecodedOp::Render);
        assert_eq!(decode(0xfc00_0000), DecodedOp::Halt);
        assert_eq!(decode(encode_op(0x3e)), DecodedOp::Unknown(0x3e));
    }

    #[test]
    fn test_legacy_map() {
        let isa = InstructionSet::legacy();
        // funct is ignored
        assert_eq!(
            isa.decode(encode_r(1, 2, 3, 0)),
            DecodedOp::Add { rd: 3, rs: 1, rt: 2 }
        );
        // in-place, zero extended
        assert_eq!(
            isa.decode(encode_i(OP_LEGACY_ADDI, 2, 9, 0xffff)),
            DecodedOp::AddImmediate {
                rt: 2,
                rs: 2,
                imm: 0xffff
            }
        );
        assert_eq!(isa.decode(encode_op(OP_LEGACY_RENDER)), DecodedOp::Render);
        assert_eq!(isa.decode(encode_op(OP_RENDER)), DecodedOp::Unknown(OP_RENDER));
        assert_eq!(isa.decode(encode_i(OP_LUI, 0, 1, 1)), DecodedOp::Unknown(OP_LUI));
    }

    #[test]
    fn test_extended_map_has_no_jump() {
        let isa = InstructionSet::extended();
        assert_eq!(isa.decode(encode_j(OP_J, 4)), DecodedOp::Unknown(OP_J));
        assert_eq!(isa.opcode_for(Encoding::DrawRectangle), Some(OP_DRAW_RECT));
        assert_eq!(isa.opcode_for(Encoding::DrawPixel), None);
        assert_eq!(InstructionSet::default().name(), "superset");
    }

    #[test]
    fn test_disassembly() {
        assert_eq!(
            decode(encode_i(OP_ADDI, 0, 2, 0xffff)).to_string(),
            "addi r2, r0, -1"
        );
        assert_eq!(decode(encode_j(OP_J, 4)).to_string(), "j 0x0000010");
    }

    #[test]
    fn test_words_to_bytes() {
        assert_eq!(
            words_to_bytes(&[0x0102_0304, 0xfc00_0000]),
            vec![1, 2, 3, 4, 0xfc, 0, 0, 0]
        );
    }

    proptest! {
        #[test]
        fn decode_is_total(word in any::<u32>()) {
            let isas = [
                InstructionSet::superset(),
                InstructionSet::legacy(),
                InstructionSet::extended(),
            ];
            for isa in isas {
                let op = isa.decode(word);
                if let DecodedOp::Unknown(o) = op {
                    prop_assert_eq!(o, opcode(word));
                }
            }
        }
    }
}
