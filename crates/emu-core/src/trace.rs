//! Instruction trace hook.
//!
//! After each step the CPU offers a complete snapshot of what executed.
//! The snapshot is captured after the instruction's effects are fully
//! applied; observers never influence emulation state.

use crate::Cycles;

/// Snapshot of a single executed instruction.
///
/// Generic over the CPU's register snapshot type, like [`crate::Cpu`]
/// implementations themselves.
#[derive(Debug, Clone)]
pub struct StepTrace<R> {
    /// Address the instruction was fetched from.
    pub pc: u32,
    /// Program counter after the instruction completed.
    pub next_pc: u32,
    /// Opcode byte.
    pub opcode: u8,
    /// Raw instruction bytes, opcode included.
    pub bytes: Vec<u8>,
    /// Disassembled text.
    pub text: String,
    /// Register state after the instruction.
    pub registers: R,
    /// Cycles consumed by this instruction.
    pub cycles: u32,
    /// Total cycles executed so far.
    pub total_cycles: Cycles,
    /// True if this instruction halted the CPU.
    pub halted: bool,
}

/// Observer receiving post-instruction snapshots.
pub trait TraceSink<R> {
    fn trace(&mut self, step: &StepTrace<R>);
}

impl<R, F: FnMut(&StepTrace<R>)> TraceSink<R> for F {
    fn trace(&mut self, step: &StepTrace<R>) {
        self(step);
    }
}
