//! Processor status register.

use std::fmt;

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// Interrupt disable.
pub const I: u8 = 0x04;
/// Decimal mode.
pub const D: u8 = 0x08;
/// Index register width select (set = 8-bit). Doubles as the break bit
/// in the 8-bit compatible modes, where it always reads as set.
pub const X: u8 = 0x10;
/// Accumulator width select (set = 8-bit). Occupies the bit that is
/// unused on the original NMOS part; reads as set in the 8-bit modes.
pub const M: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// The P register. Plain bit operations; width interpretation of M and
/// X belongs to the register file, not here.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Set N and Z from an 8-bit result.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(Z, value == 0);
        self.set_if(N, value & 0x80 != 0);
    }

    /// The byte pushed by BRK and PHP: M and X occupy the break/unused
    /// positions and are pushed as set.
    #[must_use]
    pub const fn to_pushed_byte(self) -> u8 {
        self.0 | M | X
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, ch) in [
            (N, 'N'),
            (V, 'V'),
            (M, 'M'),
            (X, 'X'),
            (D, 'D'),
            (I, 'I'),
            (Z, 'Z'),
            (C, 'C'),
        ] {
            f.write_fmt(format_args!(
                "{}",
                if self.is_set(flag) {
                    ch
                } else {
                    ch.to_ascii_lowercase()
                }
            ))?;
        }
        Ok(())
    }
}
