//! Addressing-mode helpers.
//!
//! Effective-address calculation for the execution engine. Helpers that
//! can incur a page-cross penalty return the crossing as a bool so the
//! dispatcher can add the extra cycle.

use emu_core::Bus;

use crate::cpu::Wdc65816;

impl Wdc65816 {
    /// Fetch the byte at PC and advance.
    pub(crate) fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read8(self.regs.pc_view(), &self.access());
        self.regs.advance_pc(1);
        value
    }

    /// Fetch a little-endian word at PC.
    pub(crate) fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn read<B: Bus>(&mut self, bus: &mut B, address: u32) -> u8 {
        bus.read8(address, &self.access())
    }

    pub(crate) fn write<B: Bus>(&mut self, bus: &mut B, address: u32, value: u8) {
        bus.write8(address, value, &self.access());
    }

    pub(crate) fn read_word<B: Bus>(&mut self, bus: &mut B, address: u32) -> u16 {
        let lo = self.read(bus, address);
        let hi = self.read(bus, address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Word read for JMP (indirect): the high byte wraps within the
    /// same 256-byte page, reproducing the NMOS quirk.
    pub(crate) fn read_word_page_wrap<B: Bus>(&mut self, bus: &mut B, address: u32) -> u16 {
        let lo = self.read(bus, address);
        let hi_addr = (address & 0xFFFF_FF00) | (address.wrapping_add(1) & 0xFF);
        let hi = self.read(bus, hi_addr);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let addr = self.regs.push_addr();
        self.write(bus, addr, value);
    }

    pub(crate) fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.regs.pop_addr();
        self.read(bus, addr)
    }

    /// Push high byte first so the word pulls back little-endian.
    pub(crate) fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    pub(crate) fn pull_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn addr_zero_page<B: Bus>(&mut self, bus: &mut B) -> u32 {
        u32::from(self.fetch(bus))
    }

    /// Zero page indexed wraps within the zero page.
    pub(crate) fn addr_zero_page_x<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let base = self.fetch(bus);
        u32::from(base.wrapping_add(self.regs.x8()))
    }

    pub(crate) fn addr_zero_page_y<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let base = self.fetch(bus);
        u32::from(base.wrapping_add(self.regs.y8()))
    }

    pub(crate) fn addr_absolute<B: Bus>(&mut self, bus: &mut B) -> u32 {
        u32::from(self.fetch_word(bus))
    }

    pub(crate) fn addr_absolute_x<B: Bus>(&mut self, bus: &mut B) -> (u32, bool) {
        let base = self.fetch_word(bus);
        let effective = base.wrapping_add(u16::from(self.regs.x8()));
        (u32::from(effective), page_crossed(base, effective))
    }

    pub(crate) fn addr_absolute_y<B: Bus>(&mut self, bus: &mut B) -> (u32, bool) {
        let base = self.fetch_word(bus);
        let effective = base.wrapping_add(u16::from(self.regs.y8()));
        (u32::from(effective), page_crossed(base, effective))
    }

    /// ($nn,X): pointer fetched from the zero page, X added before the
    /// indirection, wrapping within the zero page.
    pub(crate) fn addr_indexed_indirect<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let base = self.fetch(bus).wrapping_add(self.regs.x8());
        let ptr = self.read_word_page_wrap(bus, u32::from(base));
        u32::from(ptr)
    }

    /// ($nn),Y: pointer fetched from the zero page, Y added after the
    /// indirection; crossing a page during the add costs a cycle.
    pub(crate) fn addr_indirect_indexed<B: Bus>(&mut self, bus: &mut B) -> (u32, bool) {
        let base = self.fetch(bus);
        let ptr = self.read_word_page_wrap(bus, u32::from(base));
        let effective = ptr.wrapping_add(u16::from(self.regs.y8()));
        (u32::from(effective), page_crossed(ptr, effective))
    }
}

/// Crossing is relative to 256-byte boundaries.
const fn page_crossed(base: u16, effective: u16) -> bool {
    base & 0xFF00 != effective & 0xFF00
}
