//! Register file with mode-derived widths.

use crate::flags::{self, Status};

/// Effective width of a register view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
    Dword,
}

impl Width {
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xFF,
            Width::Word => 0xFFFF,
            Width::Dword => u32::MAX,
        }
    }
}

/// Which family member the core is configured as. Selects the initial
/// mode flags; everything downstream derives from those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuType {
    /// 8-bit compatible part. E stays set.
    Wdc65C02,
    /// 16-bit part. E clear, CP set.
    Wdc65816,
    /// Full-width native operation. E and CP both clear.
    Native,
}

/// One register file backs every operating mode.
///
/// Each register is a fixed 32-bit backing cell. The effective width of
/// any access is derived from (E, CP, M, X) at the moment of the access
/// and never cached; a narrow write leaves the upper backing bits
/// untouched, exactly as a narrow hardware register would.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u32,
    pub x: u32,
    pub y: u32,
    pub sp: u32,
    pub pc: u32,
    pub p: Status,
    /// Emulation flag: set forces the 8-bit compatible model.
    pub e: bool,
    /// Compatibility flag: with E clear, set selects 16-bit widths,
    /// clear selects native 32-bit widths.
    pub cp: bool,
}

impl Registers {
    #[must_use]
    pub fn new(cpu_type: CpuType) -> Self {
        let (e, cp) = match cpu_type {
            CpuType::Wdc65C02 => (true, true),
            CpuType::Wdc65816 => (false, true),
            CpuType::Native => (false, false),
        };
        let mut regs = Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            p: Status(flags::I),
            e,
            cp,
        };
        regs.apply_reset_status();
        regs.sp = regs.sp_width().mask();
        regs
    }

    /// Reset state for P: interrupts disabled, decimal clear, and the
    /// width bits forced to match the operating mode.
    pub fn apply_reset_status(&mut self) {
        self.p.set(flags::I);
        self.p.clear(flags::D);
        if self.is_native() {
            self.p.clear(flags::M);
            self.p.clear(flags::X);
        } else {
            self.p.set(flags::M);
            self.p.set(flags::X);
        }
    }

    #[must_use]
    pub const fn is_native(&self) -> bool {
        !self.e && !self.cp
    }

    /// Accumulator width. E set pins it to a byte; otherwise M selects
    /// byte, with word or dword per CP.
    #[must_use]
    pub fn a_width(&self) -> Width {
        if self.e || self.p.is_set(flags::M) {
            Width::Byte
        } else if self.cp {
            Width::Word
        } else {
            Width::Dword
        }
    }

    /// Index register width, governed by X the way A is governed by M.
    #[must_use]
    pub fn index_width(&self) -> Width {
        if self.e || self.p.is_set(flags::X) {
            Width::Byte
        } else if self.cp {
            Width::Word
        } else {
            Width::Dword
        }
    }

    /// Stack pointer width. In emulation mode the pointer is a byte
    /// within page one; otherwise it spans the full mode width.
    #[must_use]
    pub const fn sp_width(&self) -> Width {
        if self.e {
            Width::Byte
        } else if self.cp {
            Width::Word
        } else {
            Width::Dword
        }
    }

    #[must_use]
    pub const fn pc_width(&self) -> Width {
        if self.e || self.cp {
            Width::Word
        } else {
            Width::Dword
        }
    }

    /// Mode-width view of A.
    #[must_use]
    pub fn a_view(&self) -> u32 {
        self.a & self.a_width().mask()
    }

    #[must_use]
    pub fn x_view(&self) -> u32 {
        self.x & self.index_width().mask()
    }

    #[must_use]
    pub fn y_view(&self) -> u32 {
        self.y & self.index_width().mask()
    }

    #[must_use]
    pub const fn sp_view(&self) -> u32 {
        self.sp & self.sp_width().mask()
    }

    #[must_use]
    pub const fn pc_view(&self) -> u32 {
        self.pc & self.pc_width().mask()
    }

    // 8-bit accessors used by the instruction set. Narrow writes
    // preserve the upper backing bits.

    #[must_use]
    pub const fn a8(&self) -> u8 {
        self.a as u8
    }

    pub fn set_a8(&mut self, value: u8) {
        self.a = (self.a & !0xFF) | u32::from(value);
    }

    #[must_use]
    pub const fn x8(&self) -> u8 {
        self.x as u8
    }

    pub fn set_x8(&mut self, value: u8) {
        self.x = (self.x & !0xFF) | u32::from(value);
    }

    #[must_use]
    pub const fn y8(&self) -> u8 {
        self.y as u8
    }

    pub fn set_y8(&mut self, value: u8) {
        self.y = (self.y & !0xFF) | u32::from(value);
    }

    #[must_use]
    pub const fn sp8(&self) -> u8 {
        self.sp as u8
    }

    pub fn set_sp8(&mut self, value: u8) {
        self.sp = (self.sp & !0xFF) | u32::from(value);
    }

    pub fn set_pc(&mut self, value: u32) {
        self.pc = value & self.pc_width().mask();
    }

    /// Advance PC, wrapping at the current PC width.
    pub fn advance_pc(&mut self, amount: u32) {
        self.pc = self.pc.wrapping_add(amount) & self.pc_width().mask();
    }

    /// Bus address for a push, post-decrementing SP at its current
    /// width. Emulation mode confines the stack to page one.
    pub fn push_addr(&mut self) -> u32 {
        let width = self.sp_width();
        let sp = self.sp & width.mask();
        let addr = if self.e { 0x0100 | sp } else { sp };
        self.sp = (self.sp & !width.mask()) | (sp.wrapping_sub(1) & width.mask());
        addr
    }

    /// Bus address for a pull, pre-incrementing SP at its current width.
    pub fn pop_addr(&mut self) -> u32 {
        let width = self.sp_width();
        let sp = (self.sp & width.mask()).wrapping_add(1) & width.mask();
        self.sp = (self.sp & !width.mask()) | sp;
        if self.e {
            0x0100 | sp
        } else {
            sp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_the_mode_flags() {
        let mut regs = Registers::new(CpuType::Wdc65816);
        assert_eq!(regs.a_width(), Width::Byte, "reset forces M");

        regs.p.clear(flags::M);
        assert_eq!(regs.a_width(), Width::Word);
        assert_eq!(regs.index_width(), Width::Byte, "X still set");

        let native = Registers::new(CpuType::Native);
        assert_eq!(native.a_width(), Width::Dword);
        assert_eq!(native.sp_width(), Width::Dword);
        assert_eq!(native.sp, u32::MAX);
    }

    #[test]
    fn emulation_mode_pins_widths_regardless_of_m_and_x() {
        let mut regs = Registers::new(CpuType::Wdc65C02);
        regs.p.clear(flags::M);
        regs.p.clear(flags::X);
        assert_eq!(regs.a_width(), Width::Byte);
        assert_eq!(regs.index_width(), Width::Byte);
    }

    #[test]
    fn narrow_writes_preserve_upper_backing_bits() {
        let mut regs = Registers::new(CpuType::Wdc65816);
        regs.a = 0xDEAD_BEEF;
        regs.set_a8(0x42);
        assert_eq!(regs.a, 0xDEAD_BE42);
        assert_eq!(regs.a8(), 0x42);
    }

    #[test]
    fn emulation_stack_wraps_within_page_one() {
        let mut regs = Registers::new(CpuType::Wdc65C02);
        regs.set_sp8(0x00);
        assert_eq!(regs.push_addr(), 0x0100);
        assert_eq!(regs.sp8(), 0xFF, "byte pointer wrapped");
        assert_eq!(regs.pop_addr(), 0x0100);
    }

    #[test]
    fn sixteen_bit_stack_descends_from_the_top() {
        let mut regs = Registers::new(CpuType::Wdc65816);
        assert_eq!(regs.sp_view(), 0xFFFF);
        assert_eq!(regs.push_addr(), 0xFFFF);
        assert_eq!(regs.sp_view(), 0xFFFE);
    }
}
