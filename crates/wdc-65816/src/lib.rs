//! 65xx-family CPU core.
//!
//! One register file and one instruction set serve three operating
//! modes, selected at construction and by the E/CP mode flags at run
//! time: a 65C02-compatible 8-bit mode, a 65816-compatible mode with
//! 16-bit register views, and a native mode with 32-bit views. Register
//! widths are derived from the mode flags at the moment of each access
//! and never cached.
//!
//! Execution is per-instruction: [`Wdc65816::step`] fetches, decodes and
//! executes one instruction against a borrowed [`emu_core::Bus`] and
//! returns its cycle cost. The decode table in [`opcodes`] is shared
//! with the pure disassembler in [`disasm`], so the two can never drift
//! apart.

mod addressing;
mod cpu;
pub mod disasm;
pub mod flags;
pub mod opcodes;
mod registers;

pub use cpu::{HaltReason, Wdc65816};
pub use disasm::{disassemble, disassemble_range, Disassembled};
pub use flags::Status;
pub use opcodes::{decode, AddressingMode, Mnemonic, Opcode};
pub use registers::{CpuType, Registers, Width};
