//! Instruction-level behaviour and cycle-cost tests.

use emu_core::{Bus, BusAccess, Cycles};
use quickcheck::quickcheck;
use std::cell::RefCell;
use std::rc::Rc;
use wdc_65816::{flags, CpuType, HaltReason, Registers, Wdc65816, Width};

struct TestBus {
    memory: [u8; 0x10000],
}

impl TestBus {
    fn new() -> Self {
        Self {
            memory: [0; 0x10000],
        }
    }

    fn load(&mut self, address: u16, bytes: &[u8]) {
        let start = address as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Bus for TestBus {
    fn read8(&mut self, address: u32, _access: &BusAccess) -> u8 {
        self.memory[(address & 0xFFFF) as usize]
    }

    fn write8(&mut self, address: u32, value: u8, _access: &BusAccess) {
        self.memory[(address & 0xFFFF) as usize] = value;
    }
}

fn cpu_at(address: u32) -> Wdc65816 {
    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.regs.set_pc(address);
    cpu
}

#[test]
fn execute_runs_until_stp() {
    let mut bus = TestBus::new();
    // LDA #$42 / NOP / STP
    bus.load(0x1000, &[0xA9, 0x42, 0xEA, 0xDB]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    let consumed = cpu.execute(&mut bus, 0x1000);

    assert_eq!(consumed, Cycles::new(7), "2 + 2 + 3");
    assert_eq!(cpu.regs.a8(), 0x42);
    assert!(cpu.is_halted());
    assert_eq!(cpu.halt_reason(), Some(HaltReason::Stp));
}

#[test]
fn indirect_indexed_costs_five_without_a_page_cross() {
    let mut bus = TestBus::new();
    bus.load(0x0030, &[0x00, 0x50]); // pointer -> $5000
    bus.load(0x5010, &[0x77]);
    bus.load(0x0200, &[0xB1, 0x30]); // LDA ($30),Y

    let mut cpu = cpu_at(0x0200);
    cpu.regs.set_y8(0x10);

    assert_eq!(cpu.step(&mut bus), 5);
    assert_eq!(cpu.regs.a8(), 0x77);
}

#[test]
fn indirect_indexed_pays_for_the_page_cross() {
    let mut bus = TestBus::new();
    bus.load(0x0030, &[0xFF, 0x60]); // pointer -> $60FF
    bus.load(0x6100, &[0x55]);
    bus.load(0x0200, &[0xB1, 0x30]);

    let mut cpu = cpu_at(0x0200);
    cpu.regs.set_y8(0x01);

    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(cpu.regs.a8(), 0x55);
}

#[test]
fn absolute_indexed_cross_penalty_applies_to_reads_only_when_crossing() {
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xBD, 0xF0, 0x60]); // LDA $60F0,X
    bus.load(0x0203, &[0xBD, 0xF0, 0x60]);

    let mut cpu = cpu_at(0x0200);
    cpu.regs.set_x8(0x05);
    assert_eq!(cpu.step(&mut bus), 4, "$60F5 stays on the page");

    cpu.regs.set_x8(0x20);
    assert_eq!(cpu.step(&mut bus), 5, "$6110 crosses into the next page");
}

#[test]
fn stores_never_pay_the_cross_penalty() {
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x9D, 0xF0, 0x60]); // STA $60F0,X

    let mut cpu = cpu_at(0x0200);
    cpu.regs.set_a8(0xAA);
    cpu.regs.set_x8(0x20);

    assert_eq!(cpu.step(&mut bus), 5, "fixed cost, crossed or not");
    let access = BusAccess::real(Cycles::ZERO);
    assert_eq!(bus.read8(0x6110, &access), 0xAA);
}

quickcheck! {
    fn prop_immediate_loads_cost_two(value: u8) -> bool {
        let mut bus = TestBus::new();
        bus.load(0x0200, &[0xA9, value]);
        let mut cpu = cpu_at(0x0200);
        cpu.step(&mut bus) == 2 && cpu.regs.a8() == value
    }
}

#[test]
fn reset_is_idempotent() {
    let mut bus = TestBus::new();
    bus.load(0xFFFC, &[0x34, 0x12]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.reset(&mut bus);
    let first = cpu.registers();

    cpu.reset(&mut bus);
    assert_eq!(cpu.registers(), first);
    assert_eq!(first.pc_view(), 0x1234);
    assert_eq!(first.sp_view(), 0xFF);
    assert!(first.p.is_set(flags::I));
    assert!(!first.p.is_set(flags::D));
    assert_eq!(cpu.total_cycles(), Cycles::new(14), "7 per reset");
}

#[test]
fn reset_clears_a_halt() {
    let mut bus = TestBus::new();
    bus.load(0xFFFC, &[0x00, 0x10]);
    bus.load(0x1000, &[0xDB]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.reset(&mut bus);
    cpu.step(&mut bus);
    assert!(cpu.is_halted());

    cpu.reset(&mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.halt_reason(), None);
}

#[test]
fn illegal_opcode_halts_with_the_offending_byte() {
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x02]);

    let mut cpu = cpu_at(0x0200);
    assert_eq!(cpu.step(&mut bus), 2);
    assert!(cpu.is_halted());
    assert_eq!(cpu.halt_reason(), Some(HaltReason::IllegalOpcode(0x02)));

    // A halted core no longer consumes cycles.
    assert_eq!(cpu.step(&mut bus), 0);
}

#[test]
fn wai_halts_like_stp_but_reports_its_own_reason() {
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xCB]);

    let mut cpu = cpu_at(0x0200);
    assert_eq!(cpu.step(&mut bus), 3);
    assert_eq!(cpu.halt_reason(), Some(HaltReason::Wai));
}

#[test]
fn brk_pushes_state_and_takes_the_vector() {
    let mut bus = TestBus::new();
    bus.load(0xFFFE, &[0x00, 0x80]);
    bus.load(0x0300, &[0x00]); // BRK

    let mut cpu = cpu_at(0x0300);
    let pushed_status = cpu.regs.p.to_pushed_byte();

    assert_eq!(cpu.step(&mut bus), 7);
    assert!(!cpu.is_halted(), "BRK vectors, it does not halt");
    assert_eq!(cpu.regs.pc_view(), 0x8000);
    assert!(cpu.regs.p.is_set(flags::I));

    let access = BusAccess::real(Cycles::ZERO);
    assert_eq!(bus.read8(0x01FF, &access), 0x03, "return address high");
    assert_eq!(bus.read8(0x01FE, &access), 0x02, "return address low");
    assert_eq!(bus.read8(0x01FD, &access), pushed_status);
}

#[test]
fn jsr_rts_round_trip() {
    let mut bus = TestBus::new();
    bus.load(0x0400, &[0x20, 0x00, 0x05, 0xEA]); // JSR $0500 / NOP
    bus.load(0x0500, &[0x60]); // RTS

    let mut cpu = cpu_at(0x0400);
    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(cpu.regs.pc_view(), 0x0500);
    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(cpu.regs.pc_view(), 0x0403, "lands on the NOP");
}

#[test]
fn branch_costs_two_three_or_four() {
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xD0, 0x10]); // BNE +16, same page
    bus.load(0x02F0, &[0xD0, 0x20]); // BNE +32, crosses

    let mut cpu = cpu_at(0x0200);
    cpu.regs.p.set(flags::Z);
    assert_eq!(cpu.step(&mut bus), 2, "not taken");

    let mut cpu = cpu_at(0x0200);
    cpu.regs.p.clear(flags::Z);
    assert_eq!(cpu.step(&mut bus), 3, "taken within the page");
    assert_eq!(cpu.regs.pc_view(), 0x0212);

    let mut cpu = cpu_at(0x02F0);
    cpu.regs.p.clear(flags::Z);
    assert_eq!(cpu.step(&mut bus), 4, "taken across a page");
    assert_eq!(cpu.regs.pc_view(), 0x0312);
}

#[test]
fn decimal_mode_adc_adjusts_the_result() {
    let mut bus = TestBus::new();
    // SED / LDA #$09 / ADC #$01
    bus.load(0x0300, &[0xF8, 0xA9, 0x09, 0x69, 0x01]);

    let mut cpu = cpu_at(0x0300);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a8(), 0x10, "BCD carry into the high nibble");
    assert!(!cpu.regs.p.is_set(flags::C));
}

#[test]
fn stop_request_parks_the_execute_loop() {
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0xEA, 0xEA, 0xDB]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.request_stop();
    let consumed = cpu.execute(&mut bus, 0x0200);
    assert_eq!(consumed, Cycles::ZERO, "stopped before the first step");
    assert!(!cpu.is_halted());

    cpu.clear_stop_request();
    let consumed = cpu.execute(&mut bus, 0x0200);
    assert_eq!(consumed, Cycles::new(7));
    assert_eq!(cpu.halt_reason(), Some(HaltReason::Stp));
}

#[test]
fn trace_hook_sees_every_instruction() {
    let mut bus = TestBus::new();
    bus.load(0x1000, &[0xA9, 0x42, 0xEA, 0xDB]);

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.set_trace(Box::new(move |step: &emu_core::StepTrace<Registers>| {
        sink.borrow_mut()
            .push((step.pc, step.text.clone(), step.cycles, step.halted));
    }));
    cpu.execute(&mut bus, 0x1000);

    let log = log.borrow();
    assert_eq!(
        *log,
        vec![
            (0x1000, "LDA #$42".to_string(), 2, false),
            (0x1002, "NOP".to_string(), 2, false),
            (0x1003, "STP".to_string(), 3, true),
        ]
    );
}

#[test]
fn native_mode_widens_every_register() {
    let mut bus = TestBus::new();
    bus.load(0xFFFC, &[0x00, 0x10]);

    let mut cpu = Wdc65816::new(CpuType::Native);
    cpu.reset(&mut bus);

    let regs = cpu.registers();
    assert_eq!(regs.a_width(), Width::Dword);
    assert_eq!(regs.index_width(), Width::Dword);
    assert_eq!(regs.sp_view(), u32::MAX);
    assert!(!regs.p.is_set(flags::M));
    assert!(!regs.p.is_set(flags::X));

    // The instruction set still runs unchanged.
    bus.load(0x1000, &[0xA9, 0x42, 0xDB]);
    cpu.execute(&mut bus, 0x1000);
    assert_eq!(cpu.regs.a8(), 0x42);
}
