//! Raw byte storage targets backing RAM and ROM regions.

use emu_core::{BusAccess, BusTarget, Capabilities, OPEN_BUS};

/// Plain random-access memory.
pub struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Copy `data` into memory starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the data does not fit; loading past the end of physical
    /// memory is a machine-configuration defect.
    pub fn load(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Zero the entire contents.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

impl BusTarget for Ram {
    fn read(&mut self, offset: u32, _access: &BusAccess) -> u8 {
        self.bytes.get(offset as usize).copied().unwrap_or(OPEN_BUS)
    }

    fn write(&mut self, offset: u32, value: u8, _access: &BusAccess) {
        if let Some(byte) = self.bytes.get_mut(offset as usize) {
            *byte = value;
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PEEK
            .with(Capabilities::POKE)
            .with(Capabilities::WIDE)
    }

    fn read_wide(&mut self, offset: u32, _access: &BusAccess) -> Option<u16> {
        let lo = *self.bytes.get(offset as usize)?;
        let hi = *self.bytes.get(offset as usize + 1)?;
        Some(u16::from_le_bytes([lo, hi]))
    }

    fn write_wide(&mut self, offset: u32, value: u16, access: &BusAccess) -> bool {
        let [lo, hi] = value.to_le_bytes();
        self.write(offset, lo, access);
        self.write(offset + 1, hi, access);
        true
    }
}

/// Read-only memory. Writes land nowhere.
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    #[must_use]
    pub fn new(image: Vec<u8>) -> Self {
        Self { bytes: image }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl BusTarget for Rom {
    fn read(&mut self, offset: u32, _access: &BusAccess) -> u8 {
        self.bytes.get(offset as usize).copied().unwrap_or(OPEN_BUS)
    }

    fn write(&mut self, _offset: u32, _value: u8, _access: &BusAccess) {}

    fn capabilities(&self) -> Capabilities {
        Capabilities::PEEK.with(Capabilities::WIDE)
    }

    fn read_wide(&mut self, offset: u32, _access: &BusAccess) -> Option<u16> {
        let lo = *self.bytes.get(offset as usize)?;
        let hi = *self.bytes.get(offset as usize + 1)?;
        Some(u16::from_le_bytes([lo, hi]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::Cycles;

    #[test]
    fn ram_round_trips() {
        let mut ram = Ram::new(0x100);
        let access = BusAccess::real(Cycles::ZERO);

        ram.write(0x42, 0xAB, &access);
        assert_eq!(ram.read(0x42, &access), 0xAB);
    }

    #[test]
    fn ram_out_of_range_reads_open_bus() {
        let mut ram = Ram::new(0x10);
        let access = BusAccess::real(Cycles::ZERO);

        assert_eq!(ram.read(0x20, &access), OPEN_BUS);
        ram.write(0x20, 0x55, &access); // dropped, no panic
    }

    #[test]
    fn rom_ignores_writes() {
        let mut rom = Rom::new(vec![0x11, 0x22]);
        let access = BusAccess::real(Cycles::ZERO);

        rom.write(0, 0xFF, &access);
        assert_eq!(rom.read(0, &access), 0x11);
    }

    #[test]
    fn wide_access_is_little_endian() {
        let mut ram = Ram::new(0x10);
        let access = BusAccess::real(Cycles::ZERO);

        assert!(ram.write_wide(4, 0xBEEF, &access));
        assert_eq!(ram.read(4, &access), 0xEF);
        assert_eq!(ram.read(5, &access), 0xBE);
        assert_eq!(ram.read_wide(4, &access), Some(0xBEEF));
    }
}
