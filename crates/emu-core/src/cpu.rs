//! CPU core trait.

use crate::Bus;

/// A CPU core executing one instruction per `step`.
///
/// The bus is passed in, not owned, so it can be shared with other
/// components. `step` returns the cycle cost of the executed instruction;
/// the caller feeds that progress to the scheduler between instructions.
pub trait Cpu<B: Bus> {
    /// Execute one instruction. Returns the cycles consumed.
    fn step(&mut self, bus: &mut B) -> u32;

    /// Reset the CPU: load the reset vector, reinitialise registers.
    fn reset(&mut self, bus: &mut B);

    /// Current program counter, zero-extended to 32 bits.
    fn pc(&self) -> u32;

    /// True once the CPU has halted (STP, WAI or illegal opcode).
    fn is_halted(&self) -> bool;
}
