//! Page-table address translation.

use emu_core::{Bus, BusAccess, BusTarget, Capabilities, Cycles, OPEN_BUS};

use crate::page::{MapError, MapSpec, PageEntry, Region, TargetId};

/// Fixed page size: the unit of bus-mapping granularity.
pub const PAGE_SIZE: u32 = 4096;

/// Shift turning a bus address into a page index.
pub const PAGE_SHIFT: u32 = 12;

/// Page-table address translator.
///
/// Maps bus addresses to (target, offset) pairs, enforcing per-page
/// access-direction permissions: a forbidden read returns
/// [`OPEN_BUS`], a forbidden write is dropped silently. The page table
/// is mutated only by explicit mapping calls issued between accesses.
pub struct MainBus {
    pages: Vec<PageEntry>,
    targets: Vec<Box<dyn BusTarget>>,
    address_bits: u32,
    addr_mask: u32,
}

impl MainBus {
    /// Create a bus covering a `address_bits`-wide address space.
    ///
    /// # Panics
    ///
    /// Panics unless `PAGE_SHIFT <= address_bits <= 32`; the address
    /// space width is a construction-time machine parameter.
    #[must_use]
    pub fn new(address_bits: u32) -> Self {
        assert!(
            (PAGE_SHIFT..=32).contains(&address_bits),
            "address space must be {PAGE_SHIFT}..=32 bits"
        );
        let page_count = 1usize << (address_bits - PAGE_SHIFT);
        let addr_mask = if address_bits == 32 {
            u32::MAX
        } else {
            (1 << address_bits) - 1
        };
        Self {
            pages: vec![PageEntry::UNMAPPED; page_count],
            targets: Vec::new(),
            address_bits,
            addr_mask,
        }
    }

    /// Move a target into the bus-owned arena, returning its stable id.
    pub fn add_target(&mut self, target: Box<dyn BusTarget>) -> TargetId {
        self.targets.push(target);
        TargetId(self.targets.len() - 1)
    }

    /// Install identical entries across a contiguous page run.
    ///
    /// Reapplying to an already-mapped page overwrites it
    /// (last-writer-wins), which is how bank-switching controllers
    /// retarget address ranges. The target's capability set is
    /// snapshotted into the entries.
    pub fn map_page_range(&mut self, spec: &MapSpec) -> Result<(), MapError> {
        let end = spec.start_page + spec.page_count;
        if end > self.pages.len() {
            return Err(MapError::OutOfRange {
                start: spec.start_page,
                end,
                pages: self.pages.len(),
            });
        }
        let Some(target) = self.targets.get(spec.target.0) else {
            return Err(MapError::UnknownTarget(spec.target.0));
        };
        let entry = PageEntry {
            device: spec.device,
            region: spec.region,
            permission: spec.permission,
            caps: target.capabilities(),
            target: spec.target,
            base: spec.base,
        };
        for page in &mut self.pages[spec.start_page..end] {
            *page = entry;
        }
        Ok(())
    }

    /// Number of pages in the table.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Size of the address space in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        1u64 << self.address_bits
    }

    /// Region tag of the page covering `address`.
    #[must_use]
    pub fn region_at(&self, address: u32) -> Region {
        self.entry(address).region
    }

    fn entry(&self, address: u32) -> &PageEntry {
        let masked = address & self.addr_mask;
        &self.pages[(masked >> PAGE_SHIFT) as usize]
    }

    fn translate(&self, address: u32) -> (PageEntry, u32) {
        let masked = address & self.addr_mask;
        let entry = self.pages[(masked >> PAGE_SHIFT) as usize];
        (entry, masked.wrapping_sub(entry.base))
    }

    /// Read a byte, honouring page permissions.
    pub fn read8(&mut self, address: u32, access: &BusAccess) -> u8 {
        let (entry, offset) = self.translate(address);
        if !entry.permission.allows_read() {
            return OPEN_BUS;
        }
        self.targets[entry.target.0].read(offset, access)
    }

    /// Write a byte, honouring page permissions. Forbidden writes are
    /// dropped silently.
    pub fn write8(&mut self, address: u32, value: u8, access: &BusAccess) {
        let (entry, offset) = self.translate(address);
        if !entry.permission.allows_write() {
            return;
        }
        self.targets[entry.target.0].write(offset, value, access);
    }

    /// Side-effect-free read when the target supports it, else a real
    /// read. Never fails; unreadable pages answer [`OPEN_BUS`].
    pub fn peek8(&mut self, address: u32, now: Cycles) -> u8 {
        let (entry, offset) = self.translate(address);
        if !entry.permission.allows_read() {
            return OPEN_BUS;
        }
        let access = if entry.caps.contains(Capabilities::PEEK) {
            BusAccess::peek(now)
        } else {
            BusAccess::real(now)
        };
        self.targets[entry.target.0].read(offset, &access)
    }

    /// Debugger write. Targets that do not accept pokes (ROM stubs)
    /// swallow it; writable pages receive a real write.
    pub fn poke8(&mut self, address: u32, value: u8, now: Cycles) {
        let (entry, _) = self.translate(address);
        if !entry.caps.contains(Capabilities::POKE) {
            return;
        }
        self.write8(address, value, &BusAccess::real(now));
    }

    /// 16-bit little-endian read.
    ///
    /// Uses the target's wide access when the whole word lands in one
    /// page and the target supports it; otherwise two byte reads.
    pub fn read16(&mut self, address: u32, access: &BusAccess) -> u16 {
        let (entry, offset) = self.translate(address);
        let same_page = (address & self.addr_mask) & (PAGE_SIZE - 1) != PAGE_SIZE - 1;
        if same_page
            && entry.permission.allows_read()
            && entry.caps.contains(Capabilities::WIDE)
        {
            if let Some(word) = self.targets[entry.target.0].read_wide(offset, access) {
                return word;
            }
        }
        let lo = self.read8(address, access);
        let hi = self.read8(address.wrapping_add(1), access);
        u16::from_le_bytes([lo, hi])
    }

    /// Zero every writable RAM-region page through the normal write path.
    pub fn clear_ram(&mut self, now: Cycles) {
        let access = BusAccess::real(now);
        for index in 0..self.pages.len() {
            let entry = self.pages[index];
            if entry.region != Region::Ram || !entry.permission.allows_write() {
                continue;
            }
            let page_base = (index as u32) << PAGE_SHIFT;
            for off in 0..PAGE_SIZE {
                let offset = page_base.wrapping_add(off).wrapping_sub(entry.base);
                self.targets[entry.target.0].write(offset, 0, &access);
            }
        }
    }

    /// True if the page covering `address` permits the given direction.
    #[must_use]
    pub fn permits(&self, address: u32, write: bool) -> bool {
        let permission = self.entry(address).permission;
        if write {
            permission.allows_write()
        } else {
            permission.allows_read()
        }
    }
}

impl Bus for MainBus {
    fn read8(&mut self, address: u32, access: &BusAccess) -> u8 {
        MainBus::read8(self, address, access)
    }

    fn write8(&mut self, address: u32, value: u8, access: &BusAccess) {
        MainBus::write8(self, address, value, access);
    }

    fn peek8(&mut self, address: u32, now: Cycles) -> u8 {
        MainBus::peek8(self, address, now)
    }
}
