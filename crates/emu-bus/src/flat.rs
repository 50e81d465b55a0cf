//! Flat compatibility adapter over the paged bus.

use emu_core::Cycles;

use crate::MainBus;

/// Legacy read/write/size/clear surface for consumers that predate the
/// page table (debugger memory commands, PEEK/POKE plumbing).
///
/// A shim, never a second source of truth: every operation routes
/// through the paged bus. Reads prefer peek semantics so inspection
/// never perturbs device state; writes are real.
pub struct FlatMemory<'a> {
    bus: &'a mut MainBus,
    now: Cycles,
}

impl<'a> FlatMemory<'a> {
    #[must_use]
    pub fn new(bus: &'a mut MainBus, now: Cycles) -> Self {
        Self { bus, now }
    }

    #[must_use]
    pub fn read(&mut self, address: u32) -> u8 {
        self.bus.peek8(address, self.now)
    }

    pub fn write(&mut self, address: u32, value: u8) {
        self.bus.poke8(address, value, self.now);
    }

    /// Size of the underlying address space in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bus.size()
    }

    /// Zero all writable RAM.
    pub fn clear(&mut self) {
        self.bus.clear_ram(self.now);
    }
}
