//! Fetch/decode/execute engine.

use emu_core::{Bus, BusAccess, Cycles, StepTrace, TraceSink};

use crate::disasm;
use crate::flags::{self, Status};
use crate::opcodes::{self, AddressingMode, Mnemonic, Opcode};
use crate::registers::{CpuType, Registers};

/// Little-endian reset vector.
pub const RESET_VECTOR: u32 = 0xFFFC;

/// BRK/IRQ vector.
pub const IRQ_VECTOR: u32 = 0xFFFE;

const RESET_COST: u64 = 7;
const ILLEGAL_COST: u32 = 2;

/// Why the CPU stopped executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// STP instruction: definitive stop.
    Stp,
    /// WAI instruction: waiting for an interrupt that this core does
    /// not deliver, so it behaves as a stop.
    Wai,
    /// Undecodable opcode byte.
    IllegalOpcode(u8),
}

/// 65xx CPU core.
///
/// Executes one instruction per [`step`](Wdc65816::step) against a
/// borrowed bus and returns the cycle cost. The core halts on STP, WAI
/// or an illegal opcode; a halted core steps for zero cycles until
/// [`reset`](Wdc65816::reset).
pub struct Wdc65816 {
    pub regs: Registers,
    cpu_type: CpuType,
    halted: bool,
    halt_reason: Option<HaltReason>,
    stop_requested: bool,
    cycles: Cycles,
    trace: Option<Box<dyn TraceSink<Registers>>>,
}

impl Wdc65816 {
    #[must_use]
    pub fn new(cpu_type: CpuType) -> Self {
        Self {
            regs: Registers::new(cpu_type),
            cpu_type,
            halted: false,
            halt_reason: None,
            stop_requested: false,
            cycles: Cycles::ZERO,
            trace: None,
        }
    }

    /// Reinitialise registers for the configured type, load PC from the
    /// reset vector and clear any halt. Costs the fixed reset sequence.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::new(self.cpu_type);
        let access = BusAccess::real(self.cycles);
        let lo = bus.read8(RESET_VECTOR, &access);
        let hi = bus.read8(RESET_VECTOR + 1, &access);
        self.regs.set_pc(u32::from(u16::from_le_bytes([lo, hi])));
        self.halted = false;
        self.halt_reason = None;
        self.cycles += Cycles::new(RESET_COST);
    }

    /// Execute one instruction. A halted core consumes zero cycles.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.halted {
            return 0;
        }
        let pc = self.regs.pc_view();
        let opcode = self.fetch(bus);
        let cost = match opcodes::decode(opcode) {
            Some(op) => self.dispatch(bus, op),
            None => {
                self.halt(HaltReason::IllegalOpcode(opcode));
                ILLEGAL_COST
            }
        };
        self.cycles += Cycles::new(u64::from(cost));
        self.emit_trace(bus, pc, opcode, cost);
        cost
    }

    /// Run from `start` until the core halts or a stop is requested.
    /// Returns the cycles consumed by the run.
    pub fn execute<B: Bus>(&mut self, bus: &mut B, start: u32) -> Cycles {
        self.regs.set_pc(start);
        let begin = self.cycles;
        while !self.halted && !self.stop_requested {
            self.step(bus);
        }
        self.cycles - begin
    }

    /// Ask a running [`execute`](Wdc65816::execute) loop to return after
    /// the current instruction. Sticky until cleared.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn clear_stop_request(&mut self) {
        self.stop_requested = false;
    }

    #[must_use]
    pub const fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub const fn halt_reason(&self) -> Option<HaltReason> {
        self.halt_reason
    }

    /// Total cycles executed since construction, resets included.
    #[must_use]
    pub const fn total_cycles(&self) -> Cycles {
        self.cycles
    }

    #[must_use]
    pub const fn registers(&self) -> Registers {
        self.regs
    }

    /// Install a per-instruction trace observer.
    pub fn set_trace(&mut self, sink: Box<dyn TraceSink<Registers>>) {
        self.trace = Some(sink);
    }

    pub fn clear_trace(&mut self) {
        self.trace = None;
    }

    pub(crate) fn access(&self) -> BusAccess {
        BusAccess::real(self.cycles)
    }

    fn halt(&mut self, reason: HaltReason) {
        self.halted = true;
        self.halt_reason = Some(reason);
    }

    fn emit_trace<B: Bus>(&mut self, bus: &mut B, pc: u32, opcode: u8, cost: u32) {
        if self.trace.is_none() {
            return;
        }
        let now = self.cycles;
        let decoded = disasm::disassemble(&mut |addr| bus.peek8(addr, now), pc);
        let step = StepTrace {
            pc,
            next_pc: self.regs.pc_view(),
            opcode,
            bytes: decoded.bytes,
            text: decoded.text,
            registers: self.regs,
            cycles: cost,
            total_cycles: self.cycles,
            halted: self.halted,
        };
        if let Some(sink) = self.trace.as_mut() {
            sink.trace(&step);
        }
    }

    fn dispatch<B: Bus>(&mut self, bus: &mut B, op: Opcode) -> u32 {
        let base = u32::from(op.cycles);
        match op.mnemonic {
            Mnemonic::Lda => {
                let (value, extra) = self.operand_value(bus, op.mode);
                self.regs.set_a8(value);
                self.regs.p.update_nz(value);
                base + extra
            }
            Mnemonic::Ldx => {
                let (value, extra) = self.operand_value(bus, op.mode);
                self.regs.set_x8(value);
                self.regs.p.update_nz(value);
                base + extra
            }
            Mnemonic::Ldy => {
                let (value, extra) = self.operand_value(bus, op.mode);
                self.regs.set_y8(value);
                self.regs.p.update_nz(value);
                base + extra
            }

            Mnemonic::Sta => {
                let addr = self.operand_address(bus, op.mode);
                let a = self.regs.a8();
                self.write(bus, addr, a);
                base
            }
            Mnemonic::Stx => {
                let addr = self.operand_address(bus, op.mode);
                let x = self.regs.x8();
                self.write(bus, addr, x);
                base
            }
            Mnemonic::Sty => {
                let addr = self.operand_address(bus, op.mode);
                let y = self.regs.y8();
                self.write(bus, addr, y);
                base
            }

            Mnemonic::Adc => {
                let (value, extra) = self.operand_value(bus, op.mode);
                self.adc(value);
                base + extra
            }
            Mnemonic::Sbc => {
                let (value, extra) = self.operand_value(bus, op.mode);
                self.sbc(value);
                base + extra
            }

            Mnemonic::Cmp => {
                let (value, extra) = self.operand_value(bus, op.mode);
                let a = self.regs.a8();
                self.compare(a, value);
                base + extra
            }
            Mnemonic::Cpx => {
                let (value, extra) = self.operand_value(bus, op.mode);
                let x = self.regs.x8();
                self.compare(x, value);
                base + extra
            }
            Mnemonic::Cpy => {
                let (value, extra) = self.operand_value(bus, op.mode);
                let y = self.regs.y8();
                self.compare(y, value);
                base + extra
            }

            Mnemonic::And => {
                let (value, extra) = self.operand_value(bus, op.mode);
                let result = self.regs.a8() & value;
                self.regs.set_a8(result);
                self.regs.p.update_nz(result);
                base + extra
            }
            Mnemonic::Ora => {
                let (value, extra) = self.operand_value(bus, op.mode);
                let result = self.regs.a8() | value;
                self.regs.set_a8(result);
                self.regs.p.update_nz(result);
                base + extra
            }
            Mnemonic::Eor => {
                let (value, extra) = self.operand_value(bus, op.mode);
                let result = self.regs.a8() ^ value;
                self.regs.set_a8(result);
                self.regs.p.update_nz(result);
                base + extra
            }
            Mnemonic::Bit => {
                let (value, _) = self.operand_value(bus, op.mode);
                let a = self.regs.a8();
                self.regs.p.set_if(flags::Z, a & value == 0);
                self.regs.p.set_if(flags::N, value & 0x80 != 0);
                self.regs.p.set_if(flags::V, value & 0x40 != 0);
                base
            }

            Mnemonic::Asl => {
                self.modify(bus, op.mode, Self::asl);
                base
            }
            Mnemonic::Lsr => {
                self.modify(bus, op.mode, Self::lsr);
                base
            }
            Mnemonic::Rol => {
                self.modify(bus, op.mode, Self::rol);
                base
            }
            Mnemonic::Ror => {
                self.modify(bus, op.mode, Self::ror);
                base
            }
            Mnemonic::Inc => {
                self.modify(bus, op.mode, |cpu, v| {
                    let result = v.wrapping_add(1);
                    cpu.regs.p.update_nz(result);
                    result
                });
                base
            }
            Mnemonic::Dec => {
                self.modify(bus, op.mode, |cpu, v| {
                    let result = v.wrapping_sub(1);
                    cpu.regs.p.update_nz(result);
                    result
                });
                base
            }

            Mnemonic::Inx => {
                let result = self.regs.x8().wrapping_add(1);
                self.regs.set_x8(result);
                self.regs.p.update_nz(result);
                base
            }
            Mnemonic::Iny => {
                let result = self.regs.y8().wrapping_add(1);
                self.regs.set_y8(result);
                self.regs.p.update_nz(result);
                base
            }
            Mnemonic::Dex => {
                let result = self.regs.x8().wrapping_sub(1);
                self.regs.set_x8(result);
                self.regs.p.update_nz(result);
                base
            }
            Mnemonic::Dey => {
                let result = self.regs.y8().wrapping_sub(1);
                self.regs.set_y8(result);
                self.regs.p.update_nz(result);
                base
            }

            Mnemonic::Tax => {
                let a = self.regs.a8();
                self.regs.set_x8(a);
                self.regs.p.update_nz(a);
                base
            }
            Mnemonic::Tay => {
                let a = self.regs.a8();
                self.regs.set_y8(a);
                self.regs.p.update_nz(a);
                base
            }
            Mnemonic::Txa => {
                let x = self.regs.x8();
                self.regs.set_a8(x);
                self.regs.p.update_nz(x);
                base
            }
            Mnemonic::Tya => {
                let y = self.regs.y8();
                self.regs.set_a8(y);
                self.regs.p.update_nz(y);
                base
            }
            Mnemonic::Tsx => {
                let sp = self.regs.sp8();
                self.regs.set_x8(sp);
                self.regs.p.update_nz(sp);
                base
            }
            // TXS sets no flags.
            Mnemonic::Txs => {
                let x = self.regs.x8();
                self.regs.set_sp8(x);
                base
            }

            Mnemonic::Pha => {
                let a = self.regs.a8();
                self.push(bus, a);
                base
            }
            Mnemonic::Php => {
                let p = self.regs.p.to_pushed_byte();
                self.push(bus, p);
                base
            }
            Mnemonic::Pla => {
                let value = self.pull(bus);
                self.regs.set_a8(value);
                self.regs.p.update_nz(value);
                base
            }
            Mnemonic::Plp => {
                let value = self.pull(bus);
                self.set_status(value);
                base
            }

            Mnemonic::Jmp => {
                let target = if op.mode == AddressingMode::Indirect {
                    let ptr = self.addr_absolute(bus);
                    u32::from(self.read_word_page_wrap(bus, ptr))
                } else {
                    self.addr_absolute(bus)
                };
                self.regs.set_pc(target);
                base
            }
            Mnemonic::Jsr => {
                let lo = self.fetch(bus);
                // PC now addresses the high byte, the last byte of the
                // instruction; that is what JSR pushes.
                let ret = self.regs.pc_view() as u16;
                self.push_word(bus, ret);
                let hi = self.fetch(bus);
                self.regs.set_pc(u32::from(u16::from_le_bytes([lo, hi])));
                base
            }
            Mnemonic::Rts => {
                let ret = self.pull_word(bus);
                self.regs.set_pc(u32::from(ret.wrapping_add(1)));
                base
            }
            Mnemonic::Brk => {
                // Padding byte is fetched and discarded.
                self.fetch(bus);
                let pc = self.regs.pc_view() as u16;
                self.push_word(bus, pc);
                let p = self.regs.p.to_pushed_byte();
                self.push(bus, p);
                self.regs.p.set(flags::I);
                let target = self.read_word(bus, IRQ_VECTOR);
                self.regs.set_pc(u32::from(target));
                base
            }
            Mnemonic::Rti => {
                let p = self.pull(bus);
                self.set_status(p);
                let pc = self.pull_word(bus);
                self.regs.set_pc(u32::from(pc));
                base
            }

            Mnemonic::Bcc => {
                let taken = !self.regs.p.is_set(flags::C);
                self.branch(bus, taken, base)
            }
            Mnemonic::Bcs => {
                let taken = self.regs.p.is_set(flags::C);
                self.branch(bus, taken, base)
            }
            Mnemonic::Beq => {
                let taken = self.regs.p.is_set(flags::Z);
                self.branch(bus, taken, base)
            }
            Mnemonic::Bne => {
                let taken = !self.regs.p.is_set(flags::Z);
                self.branch(bus, taken, base)
            }
            Mnemonic::Bmi => {
                let taken = self.regs.p.is_set(flags::N);
                self.branch(bus, taken, base)
            }
            Mnemonic::Bpl => {
                let taken = !self.regs.p.is_set(flags::N);
                self.branch(bus, taken, base)
            }
            Mnemonic::Bvs => {
                let taken = self.regs.p.is_set(flags::V);
                self.branch(bus, taken, base)
            }
            Mnemonic::Bvc => {
                let taken = !self.regs.p.is_set(flags::V);
                self.branch(bus, taken, base)
            }

            Mnemonic::Clc => {
                self.regs.p.clear(flags::C);
                base
            }
            Mnemonic::Sec => {
                self.regs.p.set(flags::C);
                base
            }
            Mnemonic::Cli => {
                self.regs.p.clear(flags::I);
                base
            }
            Mnemonic::Sei => {
                self.regs.p.set(flags::I);
                base
            }
            Mnemonic::Clv => {
                self.regs.p.clear(flags::V);
                base
            }
            Mnemonic::Cld => {
                self.regs.p.clear(flags::D);
                base
            }
            Mnemonic::Sed => {
                self.regs.p.set(flags::D);
                base
            }

            Mnemonic::Nop => base,
            Mnemonic::Stp => {
                self.halt(HaltReason::Stp);
                base
            }
            Mnemonic::Wai => {
                self.halt(HaltReason::Wai);
                base
            }
        }
    }

    /// Operand for value-consuming instructions. The second element is
    /// the page-cross penalty in cycles.
    fn operand_value<B: Bus>(&mut self, bus: &mut B, mode: AddressingMode) -> (u8, u32) {
        match mode {
            AddressingMode::Immediate => (self.fetch(bus), 0),
            AddressingMode::ZeroPage => {
                let addr = self.addr_zero_page(bus);
                (self.read(bus, addr), 0)
            }
            AddressingMode::ZeroPageX => {
                let addr = self.addr_zero_page_x(bus);
                (self.read(bus, addr), 0)
            }
            AddressingMode::ZeroPageY => {
                let addr = self.addr_zero_page_y(bus);
                (self.read(bus, addr), 0)
            }
            AddressingMode::Absolute => {
                let addr = self.addr_absolute(bus);
                (self.read(bus, addr), 0)
            }
            AddressingMode::AbsoluteX => {
                let (addr, crossed) = self.addr_absolute_x(bus);
                (self.read(bus, addr), u32::from(crossed))
            }
            AddressingMode::AbsoluteY => {
                let (addr, crossed) = self.addr_absolute_y(bus);
                (self.read(bus, addr), u32::from(crossed))
            }
            AddressingMode::IndexedIndirect => {
                let addr = self.addr_indexed_indirect(bus);
                (self.read(bus, addr), 0)
            }
            AddressingMode::IndirectIndexed => {
                let (addr, crossed) = self.addr_indirect_indexed(bus);
                (self.read(bus, addr), u32::from(crossed))
            }
            AddressingMode::Implied
            | AddressingMode::Accumulator
            | AddressingMode::Indirect
            | AddressingMode::Relative => {
                unreachable!("{mode:?} carries no readable operand")
            }
        }
    }

    /// Effective address for stores and memory RMW. Cross penalties are
    /// already folded into these instructions' base costs.
    fn operand_address<B: Bus>(&mut self, bus: &mut B, mode: AddressingMode) -> u32 {
        match mode {
            AddressingMode::ZeroPage => self.addr_zero_page(bus),
            AddressingMode::ZeroPageX => self.addr_zero_page_x(bus),
            AddressingMode::ZeroPageY => self.addr_zero_page_y(bus),
            AddressingMode::Absolute => self.addr_absolute(bus),
            AddressingMode::AbsoluteX => self.addr_absolute_x(bus).0,
            AddressingMode::AbsoluteY => self.addr_absolute_y(bus).0,
            AddressingMode::IndexedIndirect => self.addr_indexed_indirect(bus),
            AddressingMode::IndirectIndexed => self.addr_indirect_indexed(bus).0,
            AddressingMode::Implied
            | AddressingMode::Accumulator
            | AddressingMode::Immediate
            | AddressingMode::Indirect
            | AddressingMode::Relative => {
                unreachable!("{mode:?} has no effective address")
            }
        }
    }

    /// Read-modify-write, or modify A directly in accumulator mode.
    fn modify<B: Bus>(&mut self, bus: &mut B, mode: AddressingMode, f: fn(&mut Self, u8) -> u8) {
        if mode == AddressingMode::Accumulator {
            let a = self.regs.a8();
            let result = f(self, a);
            self.regs.set_a8(result);
        } else {
            let addr = self.operand_address(bus, mode);
            let value = self.read(bus, addr);
            let result = f(self, value);
            self.write(bus, addr, result);
        }
    }

    fn branch<B: Bus>(&mut self, bus: &mut B, taken: bool, base: u32) -> u32 {
        let offset = self.fetch(bus) as i8;
        if !taken {
            return base;
        }
        let origin = self.regs.pc_view();
        self.regs.set_pc(origin.wrapping_add(offset as u32));
        let target = self.regs.pc_view();
        let crossed = (origin ^ target) & 0xFF00 != 0;
        base + 1 + u32::from(crossed)
    }

    /// Restore P from a pushed byte. Emulation mode pins the width bits.
    fn set_status(&mut self, byte: u8) {
        self.regs.p = Status(byte);
        if self.regs.e {
            self.regs.p.set(flags::M);
            self.regs.p.set(flags::X);
        }
    }

    fn adc(&mut self, value: u8) {
        if self.regs.p.is_set(flags::D) {
            self.adc_decimal(value);
        } else {
            self.adc_binary(value);
        }
    }

    fn adc_binary(&mut self, value: u8) {
        let a = u16::from(self.regs.a8());
        let v = u16::from(value);
        let c = u16::from(self.regs.p.is_set(flags::C));

        let result = a + v + c;
        let result8 = result as u8;

        self.regs.p.set_if(flags::C, result > 0xFF);
        self.regs.p.set_if(
            flags::V,
            (self.regs.a8() ^ result8) & (value ^ result8) & 0x80 != 0,
        );
        self.regs.p.update_nz(result8);
        self.regs.set_a8(result8);
    }

    fn adc_decimal(&mut self, value: u8) {
        let a = u16::from(self.regs.a8());
        let v = u16::from(value);
        let c = u16::from(self.regs.p.is_set(flags::C));

        let mut low = (a & 0x0F) + (v & 0x0F) + c;
        if low > 9 {
            low += 6;
        }
        let mut high = (a >> 4) + (v >> 4) + u16::from(low > 0x0F);

        // Z, N and V follow the intermediate binary result.
        let binary = (a + v + c) as u8;
        self.regs.p.set_if(flags::Z, binary == 0);
        self.regs.p.set_if(flags::N, high & 0x08 != 0);
        self.regs.p.set_if(
            flags::V,
            (a ^ u16::from(binary)) & (v ^ u16::from(binary)) & 0x80 != 0,
        );

        if high > 9 {
            high += 6;
        }
        self.regs.p.set_if(flags::C, high > 0x0F);
        self.regs.set_a8(((high << 4) | (low & 0x0F)) as u8);
    }

    fn sbc(&mut self, value: u8) {
        if self.regs.p.is_set(flags::D) {
            self.sbc_decimal(value);
        } else {
            self.sbc_binary(value);
        }
    }

    fn sbc_binary(&mut self, value: u8) {
        let a = u16::from(self.regs.a8());
        let v = u16::from(value);
        let borrow = u16::from(!self.regs.p.is_set(flags::C));

        let result = a.wrapping_sub(v).wrapping_sub(borrow);
        let result8 = result as u8;

        self.regs.p.set_if(flags::C, result < 0x100);
        self.regs.p.set_if(
            flags::V,
            (self.regs.a8() ^ value) & (self.regs.a8() ^ result8) & 0x80 != 0,
        );
        self.regs.p.update_nz(result8);
        self.regs.set_a8(result8);
    }

    fn sbc_decimal(&mut self, value: u8) {
        let a = i16::from(self.regs.a8());
        let v = i16::from(value);
        let borrow = i16::from(!self.regs.p.is_set(flags::C));

        let mut low = (a & 0x0F) - (v & 0x0F) - borrow;
        if low < 0 {
            low = ((low - 6) & 0x0F) - 0x10;
        }
        let mut high = (a >> 4) - (v >> 4) - i16::from(low < 0);
        if high < 0 {
            high = (high - 6) & 0x0F;
        }

        // Flags follow the binary result.
        let binary = a.wrapping_sub(v).wrapping_sub(borrow);
        self.regs.p.set_if(flags::C, binary >= 0);
        self.regs.p.update_nz(binary as u8);
        self.regs
            .p
            .set_if(flags::V, (a ^ binary) & (!v ^ binary) & 0x80 != 0);

        self.regs.set_a8(((high << 4) | (low & 0x0F)) as u8);
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.regs.p.set_if(flags::C, register >= value);
        self.regs.p.update_nz(result);
    }

    fn asl(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.regs.p.set_if(flags::C, value & 0x80 != 0);
        self.regs.p.update_nz(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.regs.p.set_if(flags::C, value & 0x01 != 0);
        self.regs.p.update_nz(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | u8::from(self.regs.p.is_set(flags::C));
        self.regs.p.set_if(flags::C, value & 0x80 != 0);
        self.regs.p.update_nz(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | (u8::from(self.regs.p.is_set(flags::C)) << 7);
        self.regs.p.set_if(flags::C, value & 0x01 != 0);
        self.regs.p.update_nz(result);
        result
    }
}

impl<B: Bus> emu_core::Cpu<B> for Wdc65816 {
    fn step(&mut self, bus: &mut B) -> u32 {
        Wdc65816::step(self, bus)
    }

    fn reset(&mut self, bus: &mut B) {
        Wdc65816::reset(self, bus);
    }

    fn pc(&self) -> u32 {
        self.regs.pc_view()
    }

    fn is_halted(&self) -> bool {
        self.halted
    }
}
