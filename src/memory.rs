use crate::error::{LayoutError, VmError};
use log::debug;

// NB. addresses are u32 as per the machine; offsets and lengths are usize to
//     stop endless casting

/// what a region lets the program do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
}

impl Permissions {
    pub const READ_WRITE: Permissions = Permissions {
        read: true,
        write: true,
    };
    pub const READ_ONLY: Permissions = Permissions {
        read: true,
        write: false,
    };
}

/// A contiguous, permissioned span of the address space backed by bytes.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    base: u32,
    permissions: Permissions,
    bytes: Box<[u8]>,
}

impl Region {
    /// zeroed read/write memory
    pub fn ram(name: &str, base: u32, size: usize) -> Self {
        Region {
            name: name.to_string(),
            base,
            permissions: Permissions::READ_WRITE,
            bytes: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// read-only memory with fixed contents
    pub fn rom(name: &str, base: u32, contents: &[u8]) -> Self {
        Region {
            name: name.to_string(),
            base,
            permissions: Permissions::READ_ONLY,
            bytes: contents.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// one past the last address, widened so the top of the space fits
    fn end(&self) -> u64 {
        self.base as u64 + self.bytes.len() as u64
    }

    fn contains(&self, addr: u32) -> bool {
        addr >= self.base && (addr as u64) < self.end()
    }
}

/// Where an address landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// index of the region in the map
    pub region: usize,
    /// offset of the address from the region base
    pub offset: usize,
    /// total size of the region
    pub len: usize,
    pub permissions: Permissions,
}

impl Mapping {
    /// bytes from the address to the end of its region
    pub fn remaining(&self) -> usize {
        self.len - self.offset
    }
}

/// Represents the memory map: RAM, ROM, and whatever else is wired in.
///
/// Implementors provide address translation and single-byte access; word
/// access and bulk loads are built on top and share the same checks.
pub trait MemoryMap {
    /// translate an address to its region and offset
    fn map(&self, addr: u32) -> Result<Mapping, VmError>;

    /// read a single byte
    fn read_byte(&mut self, addr: u32) -> Result<u8, VmError>;

    /// write a single byte
    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), VmError>;

    /// fail unless `len` bytes from `addr` sit inside one region
    fn check_span(&self, addr: u32, len: usize) -> Result<Mapping, VmError> {
        let m = self.map(addr)?;
        if len > m.remaining() {
            return Err(VmError::UnalignedOrOutOfBounds(addr));
        }
        Ok(m)
    }

    /// get a big-endian four-byte word
    fn read_word(&mut self, addr: u32) -> Result<u32, VmError> {
        self.check_span(addr, 4)?;
        let mut word = [0u8; 4];
        for (i, b) in (0u32..).zip(word.iter_mut()) {
            *b = self.read_byte(addr + i)?;
        }
        Ok(u32::from_be_bytes(word))
    }

    /// put a big-endian four-byte word
    fn write_word(&mut self, addr: u32, value: u32) -> Result<(), VmError> {
        let m = self.check_span(addr, 4)?;
        if !m.permissions.write {
            return Err(VmError::WriteProtected(addr));
        }
        for (i, b) in (0u32..).zip(value.to_be_bytes()) {
            self.write_byte(addr + i, b)?;
        }
        Ok(())
    }

    /// write a chunk of bytes starting at `addr`
    ///
    /// The whole range is checked before anything is written, so a failed
    /// load leaves memory untouched.
    fn load(&mut self, addr: u32, data: &[u8]) -> Result<(), VmError> {
        let mut cursor = addr;
        let mut left = data.len();
        while left > 0 {
            let m = self.map(cursor)?;
            if !m.permissions.write {
                return Err(VmError::WriteProtected(cursor));
            }
            let chunk = left.min(m.remaining());
            left -= chunk;
            if left > 0 {
                cursor = u32::try_from(cursor as u64 + chunk as u64)
                    .map_err(|_| VmError::UnalignedOrOutOfBounds(cursor))?;
            }
        }
        for (i, b) in (0u32..).zip(data.iter()) {
            self.write_byte(addr + i, *b)?;
        }
        Ok(())
    }
}

/// 8MB of main RAM, as on the real console
pub const RDRAM_BASE: u32 = 0x0000_0000;
pub const RDRAM_SIZE: usize = 8 * 1024 * 1024;

/// boot ROM; we never run a boot sequence so it stays zeroed
pub const PIF_ROM_BASE: u32 = 0x1fc0_0000;
pub const PIF_ROM_SIZE: usize = 2048;

/// the standard memory map
///   0x0000_0000-0x007f_ffff  rdram   (r/w)
///   0x1fc0_0000-0x1fc0_07ff  pif rom (r/o)
pub fn default_layout() -> Vec<Region> {
    vec![
        Region::ram("rdram", RDRAM_BASE, RDRAM_SIZE),
        Region::rom("pif_rom", PIF_ROM_BASE, &[0u8; PIF_ROM_SIZE]),
    ]
}

/// read-only snapshot of memory traffic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryStats {
    pub reads: u64,
    pub writes: u64,
    pub rdram_usage_percent: f64,
}

/// A set of disjoint regions, sorted by base address.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    regions: Vec<Region>,
    /// the first writable region; usage stats are reported against it
    primary: Option<usize>,
    reads: u64,
    writes: u64,
}

impl AddressSpace {
    pub fn new(mut regions: Vec<Region>) -> Result<Self, LayoutError> {
        regions.sort_by_key(|r| r.base);
        for r in &regions {
            if r.bytes.is_empty() {
                return Err(LayoutError::EmptyRegion(r.base));
            }
            if r.end() > 1u64 << 32 {
                return Err(LayoutError::AddressOverflow(r.base));
            }
        }
        for pair in regions.windows(2) {
            if pair[0].end() > pair[1].base as u64 {
                return Err(LayoutError::Overlap(pair[0].base, pair[1].base));
            }
        }
        let primary = regions.iter().position(|r| r.permissions.write);
        debug!(
            "address space: {}",
            regions
                .iter()
                .map(|r| format!("{}@0x{:08x}+0x{:x}", r.name, r.base, r.size()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(AddressSpace {
            regions,
            primary,
            reads: 0,
            writes: 0,
        })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Counters plus the share of non-zero bytes in the primary region.
    pub fn get_stats(&self) -> MemoryStats {
        let rdram_usage_percent = match self.primary.map(|i| &self.regions[i]) {
            Some(r) => {
                let used = r.bytes.iter().filter(|b| **b != 0).count();
                used as f64 / r.size() as f64 * 100.0
            }
            None => 0.0,
        };
        MemoryStats {
            reads: self.reads,
            writes: self.writes,
            rdram_usage_percent,
        }
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        AddressSpace {
            regions: default_layout(),
            primary: Some(0),
            reads: 0,
            writes: 0,
        }
    }
}

impl MemoryMap for AddressSpace {
    fn map(&self, addr: u32) -> Result<Mapping, VmError> {
        // first region starting above addr; the candidate is the one before it
        let idx = self.regions.partition_point(|r| r.base <= addr);
        let region = idx
            .checked_sub(1)
            .filter(|&i| self.regions[i].contains(addr))
            .ok_or(VmError::UnmappedAddress(addr))?;
        let r = &self.regions[region];
        Ok(Mapping {
            region,
            offset: (addr - r.base) as usize,
            len: r.size(),
            permissions: r.permissions,
        })
    }

    fn read_byte(&mut self, addr: u32) -> Result<u8, VmError> {
        let m = self.map(addr)?;
        if !m.permissions.read {
            return Err(VmError::UnmappedAddress(addr));
        }
        self.reads += 1;
        Ok(self.regions[m.region].bytes[m.offset])
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), VmError> {
        let m = self.map(addr)?;
        if !m.permissions.write {
            return Err(VmError::WriteProtected(addr));
        }
        self.writes += 1;
        self.regions[m.region].bytes[m.offset] = value;
        Ok(())
    }
}
