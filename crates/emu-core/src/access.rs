//! Per-access bus context.

use crate::Cycles;

/// Context threaded by reference through every bus read and write.
///
/// Carries the global cycle count at which the access happens and whether
/// the access is side-effect-free. Every stateful device handler must
/// branch on [`side_effect_free`](Self::side_effect_free) before mutating
/// a latch, strobe, counter or timer: a debugger peek computes the value
/// a real access would produce without consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAccess {
    /// Global cycle count at the time of the access.
    pub cycle: Cycles,
    /// True for inspection accesses that must not disturb device state.
    pub side_effect_free: bool,
}

impl BusAccess {
    /// A real, CPU-driven access.
    #[must_use]
    pub const fn real(cycle: Cycles) -> Self {
        Self {
            cycle,
            side_effect_free: false,
        }
    }

    /// A side-effect-free inspection access (debugger peek).
    #[must_use]
    pub const fn peek(cycle: Cycles) -> Self {
        Self {
            cycle,
            side_effect_free: true,
        }
    }
}
