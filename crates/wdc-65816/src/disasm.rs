//! Pure instruction decode.
//!
//! Reads bytes through a caller-supplied closure and produces immutable
//! snapshots; typically fed from a bus peek so disassembly never
//! disturbs device state. Decoding shares [`crate::opcodes`] with the
//! execution engine.

use crate::opcodes::{self, AddressingMode, Mnemonic, Opcode};

/// One decoded instruction. Owns its bytes and text; no reference back
/// into CPU or bus state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembled {
    /// Address the opcode byte was read from.
    pub address: u32,
    /// Raw instruction bytes, opcode first.
    pub bytes: Vec<u8>,
    /// `None` for an illegal encoding.
    pub mnemonic: Option<Mnemonic>,
    pub mode: AddressingMode,
    /// Conventional assembly text, e.g. `LDA ($30),Y`.
    pub text: String,
}

impl Disassembled {
    /// Instruction length in bytes.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decode the instruction at `address`.
///
/// Illegal opcodes decode as a one-byte `.byte $xx` line so a listing
/// can always make progress.
pub fn disassemble(read: &mut dyn FnMut(u32) -> u8, address: u32) -> Disassembled {
    let opcode = read(address);
    let Some(op) = opcodes::decode(opcode) else {
        return Disassembled {
            address,
            bytes: vec![opcode],
            mnemonic: None,
            mode: AddressingMode::Implied,
            text: format!(".byte ${opcode:02X}"),
        };
    };

    let mut bytes = vec![opcode];
    for index in 1..=op.mode.operand_len() {
        bytes.push(read(address.wrapping_add(index)));
    }
    let text = format_instruction(op, &bytes, address);

    Disassembled {
        address,
        bytes,
        mnemonic: Some(op.mnemonic),
        mode: op.mode,
        text,
    }
}

/// Decode `count` consecutive instructions starting at `start`.
#[must_use]
pub fn disassemble_range(
    read: &mut dyn FnMut(u32) -> u8,
    start: u32,
    count: usize,
) -> Vec<Disassembled> {
    let mut lines = Vec::with_capacity(count);
    let mut address = start;
    for _ in 0..count {
        let line = disassemble(read, address);
        address = address.wrapping_add(line.len());
        lines.push(line);
    }
    lines
}

fn format_instruction(op: Opcode, bytes: &[u8], address: u32) -> String {
    let operand8 = bytes.get(1).copied().unwrap_or(0);
    let operand16 = u16::from_le_bytes([operand8, bytes.get(2).copied().unwrap_or(0)]);
    match op.mode {
        AddressingMode::Implied => op.mnemonic.to_string(),
        AddressingMode::Accumulator => format!("{} A", op.mnemonic),
        AddressingMode::Immediate => format!("{} #${operand8:02X}", op.mnemonic),
        AddressingMode::ZeroPage => format!("{} ${operand8:02X}", op.mnemonic),
        AddressingMode::ZeroPageX => format!("{} ${operand8:02X},X", op.mnemonic),
        AddressingMode::ZeroPageY => format!("{} ${operand8:02X},Y", op.mnemonic),
        AddressingMode::Absolute => format!("{} ${operand16:04X}", op.mnemonic),
        AddressingMode::AbsoluteX => format!("{} ${operand16:04X},X", op.mnemonic),
        AddressingMode::AbsoluteY => format!("{} ${operand16:04X},Y", op.mnemonic),
        AddressingMode::Indirect => format!("{} (${operand16:04X})", op.mnemonic),
        AddressingMode::IndexedIndirect => format!("{} (${operand8:02X},X)", op.mnemonic),
        AddressingMode::IndirectIndexed => format!("{} (${operand8:02X}),Y", op.mnemonic),
        AddressingMode::Relative => {
            // Branch targets resolve relative to the following instruction.
            let target = address
                .wrapping_add(2)
                .wrapping_add(i32::from(operand8 as i8) as u32)
                & 0xFFFF;
            format!("{} ${target:04X}", op.mnemonic)
        }
    }
}
