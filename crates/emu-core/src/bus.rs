//! Memory and I/O bus interfaces.

use crate::{BusAccess, Cycles};

/// The fixed value returned when no device claims an address, or when a
/// read is refused by page permissions or a missing capability.
pub const OPEN_BUS: u8 = 0xFF;

/// Auxiliary operations a bus target supports.
///
/// Callers check these before attempting the operation and degrade
/// gracefully (open bus for reads, no-op for writes) when unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(pub u8);

impl Capabilities {
    /// No auxiliary operations.
    pub const NONE: Self = Self(0);

    /// Target can answer side-effect-free reads.
    pub const PEEK: Self = Self(0x01);

    /// Target accepts direct debugger writes.
    pub const POKE: Self = Self(0x02);

    /// Target supports 16-bit wide access.
    pub const WIDE: Self = Self(0x04);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// An endpoint on the bus: RAM, ROM, or a memory-mapped device.
///
/// Targets receive offsets relative to their own physical base, not bus
/// addresses. The access context is forwarded unchanged from the
/// originating call so handlers can tell real accesses from peeks.
pub trait BusTarget {
    /// Read a byte at the given target-relative offset.
    fn read(&mut self, offset: u32, access: &BusAccess) -> u8;

    /// Write a byte at the given target-relative offset.
    fn write(&mut self, offset: u32, value: u8, access: &BusAccess);

    /// Which auxiliary operations this target supports.
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// 16-bit little-endian read. Only meaningful when the target
    /// advertises [`Capabilities::WIDE`]; the default refuses.
    fn read_wide(&mut self, _offset: u32, _access: &BusAccess) -> Option<u16> {
        None
    }

    /// 16-bit little-endian write. Returns false when unsupported.
    fn write_wide(&mut self, _offset: u32, _value: u16, _access: &BusAccess) -> bool {
        false
    }
}

/// Memory and I/O bus interface, as seen by a CPU.
///
/// Components access memory and peripherals through this trait. The bus
/// handles address decoding and routing to the appropriate device.
pub trait Bus {
    /// Read a byte from the given bus address.
    fn read8(&mut self, address: u32, access: &BusAccess) -> u8;

    /// Write a byte to the given bus address.
    fn write8(&mut self, address: u32, value: u8, access: &BusAccess);

    /// Side-effect-free read used for inspection and tracing.
    ///
    /// The default forwards a peek-flagged access through `read8`; paged
    /// buses override this to honour target capabilities.
    fn peek8(&mut self, address: u32, now: Cycles) -> u8 {
        self.read8(address, &BusAccess::peek(now))
    }
}
