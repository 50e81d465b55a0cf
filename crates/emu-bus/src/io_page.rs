//! Soft-switch page dispatcher.
//!
//! One page of the address space is conventionally reserved for soft
//! switches: locations whose mere access triggers a hardware state
//! change. Each of the 256 byte offsets routes independently to a
//! registered handler; all device state lives in the owning device, the
//! dispatcher only routes.

use emu_core::{BusAccess, BusTarget, Capabilities, OPEN_BUS};
use thiserror::Error;

/// Handler answering reads for one offset.
pub type ReadHandler = Box<dyn FnMut(u8, &BusAccess) -> u8>;

/// Handler accepting writes for one offset.
pub type WriteHandler = Box<dyn FnMut(u8, u8, &BusAccess)>;

/// Duplicate registration is a configuration defect, caught at setup
/// time, never a runtime condition.
#[derive(Debug, Error)]
pub enum IoPageError {
    #[error("read handler already registered for offset ${0:02X}")]
    ReadSlotTaken(u8),
    #[error("write handler already registered for offset ${0:02X}")]
    WriteSlotTaken(u8),
}

/// 256-slot dispatch table for the reserved I/O page.
///
/// Fixed arrays of optional handler closures indexed directly by offset;
/// no per-access lookup beyond the array index. Unregistered offsets
/// read [`OPEN_BUS`] and drop writes.
pub struct IoPage {
    reads: [Option<ReadHandler>; 256],
    writes: [Option<WriteHandler>; 256],
}

impl Default for IoPage {
    fn default() -> Self {
        Self::new()
    }
}

impl IoPage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reads: std::array::from_fn(|_| None),
            writes: std::array::from_fn(|_| None),
        }
    }

    /// Claim the read side of an offset.
    ///
    /// Handlers receive `(offset, access)` and must branch on
    /// `access.side_effect_free` before mutating device state.
    pub fn register_read(&mut self, offset: u8, handler: ReadHandler) -> Result<(), IoPageError> {
        let slot = &mut self.reads[offset as usize];
        if slot.is_some() {
            return Err(IoPageError::ReadSlotTaken(offset));
        }
        *slot = Some(handler);
        Ok(())
    }

    /// Claim the write side of an offset.
    pub fn register_write(&mut self, offset: u8, handler: WriteHandler) -> Result<(), IoPageError> {
        let slot = &mut self.writes[offset as usize];
        if slot.is_some() {
            return Err(IoPageError::WriteSlotTaken(offset));
        }
        *slot = Some(handler);
        Ok(())
    }
}

impl BusTarget for IoPage {
    fn read(&mut self, offset: u32, access: &BusAccess) -> u8 {
        match &mut self.reads[(offset & 0xFF) as usize] {
            Some(handler) => handler((offset & 0xFF) as u8, access),
            None => OPEN_BUS,
        }
    }

    fn write(&mut self, offset: u32, value: u8, access: &BusAccess) {
        if let Some(handler) = &mut self.writes[(offset & 0xFF) as usize] {
            handler((offset & 0xFF) as u8, value, access);
        }
    }

    // Peeks are forwarded to the handlers, which answer them without
    // mutating state; pokes are ordinary writes (soft switches are
    // triggered by access, and POKE is a real access).
    fn capabilities(&self) -> Capabilities {
        Capabilities::PEEK.with(Capabilities::POKE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::Cycles;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn unregistered_offset_is_open_bus() {
        let mut page = IoPage::new();
        let access = BusAccess::real(Cycles::ZERO);

        assert_eq!(page.read(0x30, &access), OPEN_BUS);
        page.write(0x30, 0x12, &access); // dropped
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut page = IoPage::new();

        page.register_read(0x10, Box::new(|_, _| 0)).unwrap();
        assert!(matches!(
            page.register_read(0x10, Box::new(|_, _| 1)),
            Err(IoPageError::ReadSlotTaken(0x10))
        ));
    }

    #[test]
    fn peek_does_not_consume_a_strobe() {
        let mut page = IoPage::new();
        let strobe = Rc::new(Cell::new(true));

        let s = Rc::clone(&strobe);
        page.register_read(
            0x00,
            Box::new(move |_, access| {
                let armed = s.get();
                if !access.side_effect_free {
                    s.set(false);
                }
                u8::from(armed)
            }),
        )
        .unwrap();

        let peek = BusAccess::peek(Cycles::ZERO);
        let real = BusAccess::real(Cycles::ZERO);

        assert_eq!(page.read(0x00, &peek), 1, "peek sees the armed strobe");
        assert_eq!(page.read(0x00, &peek), 1, "peeking never consumes");
        assert_eq!(page.read(0x00, &real), 1, "real read consumes it");
        assert_eq!(page.read(0x00, &real), 0, "strobe is now clear");
    }
}
