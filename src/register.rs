/// How register 0 behaves.
///
/// The machine this imitates hardwires r0 to zero. The programs written for
/// the emulator don't rely on that either way, so both are on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroRegister {
    /// r0 is an ordinary register
    #[default]
    Mutable,
    /// writes to r0 are dropped; it always reads 0
    Hardwired,
}

pub const REGISTER_COUNT: usize = 32;

/// 32 general purpose registers plus the program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u32; REGISTER_COUNT],
    pc: u32,
    zero: ZeroRegister,
}

impl RegisterFile {
    pub fn new(zero: ZeroRegister) -> Self {
        RegisterFile {
            regs: [0; REGISTER_COUNT],
            pc: 0,
            zero,
        }
    }

    /// register indices are 5-bit fields, so only the low 5 bits count
    pub fn get(&self, index: u8) -> u32 {
        self.regs[(index & 0x1f) as usize]
    }

    pub fn set(&mut self, index: u8, value: u32) {
        let i = (index & 0x1f) as usize;
        if i == 0 && self.zero == ZeroRegister::Hardwired {
            return;
        }
        self.regs[i] = value;
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn zero_policy(&self) -> ZeroRegister {
        self.zero
    }

    pub fn as_slice(&self) -> &[u32; REGISTER_COUNT] {
        &self.regs
    }

    /// back to power-on values
    pub fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
        self.pc = 0;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        RegisterFile::new(ZeroRegister::default())
    }
}
