use std::fmt;
use thiserror::Error;

/// Everything that can stop a running machine. None of these are retried;
/// the machine moves to `Faulted` and stays there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("unmapped address 0x{0:08x}")]
    UnmappedAddress(u32),
    #[error("write to read-only memory at 0x{0:08x}")]
    WriteProtected(u32),
    #[error("access at 0x{0:08x} runs past the end of its region")]
    UnalignedOrOutOfBounds(u32),
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u32),
    #[error("display sink failed: {0}")]
    DisplaySink(String),
}

/// the shape of a fault, without its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    UnmappedAddress,
    WriteProtected,
    UnalignedOrOutOfBounds,
    UnknownOpcode,
    DisplaySink,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultKind::UnmappedAddress => "unmapped address",
            FaultKind::WriteProtected => "write protected",
            FaultKind::UnalignedOrOutOfBounds => "out of bounds",
            FaultKind::UnknownOpcode => "unknown opcode",
            FaultKind::DisplaySink => "display sink",
        };
        f.write_str(s)
    }
}

impl VmError {
    pub fn kind(&self) -> FaultKind {
        match self {
            VmError::UnmappedAddress(_) => FaultKind::UnmappedAddress,
            VmError::WriteProtected(_) => FaultKind::WriteProtected,
            VmError::UnalignedOrOutOfBounds(_) => FaultKind::UnalignedOrOutOfBounds,
            VmError::UnknownOpcode(_) => FaultKind::UnknownOpcode,
            VmError::DisplaySink(_) => FaultKind::DisplaySink,
        }
    }

    /// the address or opcode the fault concerns (0 for sink failures)
    pub fn value(&self) -> u32 {
        match self {
            VmError::UnmappedAddress(v)
            | VmError::WriteProtected(v)
            | VmError::UnalignedOrOutOfBounds(v)
            | VmError::UnknownOpcode(v) => *v,
            VmError::DisplaySink(_) => 0,
        }
    }
}

/// Problems with a memory layout, caught when an address space is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("region at 0x{0:08x} has no bytes")]
    EmptyRegion(u32),
    #[error("region at 0x{0:08x} overlaps region at 0x{1:08x}")]
    Overlap(u32, u32),
    #[error("region at 0x{0:08x} runs past the top of the address space")]
    AddressOverflow(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_value() {
        let e = VmError::WriteProtected(0x1fc0_0004);
        assert_eq!(e.kind(), FaultKind::WriteProtected);
        assert_eq!(e.value(), 0x1fc0_0004);
        assert_eq!(VmError::UnknownOpcode(0x3e).value(), 0x3e);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            VmError::UnmappedAddress(0x0080_0000).to_string(),
            "unmapped address 0x00800000"
        );
        assert_eq!(VmError::UnknownOpcode(7).to_string(), "unknown opcode 0x07");
        assert_eq!(
            LayoutError::Overlap(0, 0x100).to_string(),
            "region at 0x00000000 overlaps region at 0x00000100"
        );
    }
}
